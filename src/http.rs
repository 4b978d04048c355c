//! HTTP utilities shared by the ServiceNow and Gemini clients.

use reqwest::{Client, RequestBuilder, Response};

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    match transport_options {
        TransportOptions::Http { timeout, proxy } => {
            if let Some(t) = timeout {
                builder = builder.timeout(*t);
            }
            if let Some(proxy_url) = proxy {
                let p = reqwest::Proxy::all(proxy_url)
                    .map_err(|e| ClientError::Config(format!("invalid proxy {proxy_url}: {e}")))?;
                builder = builder.proxy(p);
            }
        }
    }

    builder
        .build()
        .map_err(|e| ClientError::Config(format!("could not build HTTP client: {e}")))
}

/// Extension trait for RequestBuilder that logs the request body.
pub trait RequestBuilderExt {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        if let Ok(req_body) = serde_json::to_string_pretty(json) {
            tracing::debug!("request body ({} bytes):\n{}", req_body.len(), req_body);
        }

        self.json(json)
    }
}

/// Send a request, mapping transport failures to [`ClientError::Connectivity`].
pub async fn send(request: RequestBuilder, url: &str) -> Result<Response, ClientError> {
    request.send().await.map_err(|source| ClientError::Connectivity {
        url: url.to_string(),
        source,
    })
}

/// Extension trait for Response that logs the response body.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Read the body as text and log it. A failed read is a connectivity error.
    async fn text_logged(self) -> Result<String, ClientError>;

    /// Parse the body as JSON and log it.
    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, ClientError>;
}

#[async_trait::async_trait]
impl ResponseExt for Response {
    async fn text_logged(self) -> Result<String, ClientError> {
        let url = self.url().to_string();
        let status = self.status();
        let text = self
            .text()
            .await
            .map_err(|source| ClientError::Connectivity { url, source })?;
        tracing::debug!(%status, "response ({} bytes):\n{}", text.len(), text);
        Ok(text)
    }

    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, ClientError> {
        let text = self.text_logged().await?;
        serde_json::from_str(&text).map_err(ClientError::from)
    }
}
