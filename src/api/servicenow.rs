//! ServiceNow Table API client.
//!
//! Every call goes to `{instance}/api/now/table/{table}[/{sys_id}]` with basic
//! authentication and JSON bodies. Successful responses carry the record in a
//! `{"result": ...}` envelope, which is unwrapped here.
//! See: <https://developer.servicenow.com/dev.do#!/reference/api/latest/rest/c_TableAPI>

use async_trait::async_trait;
use base64::prelude::{Engine, BASE64_STANDARD};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::client::{ClientError, Fields, ListQuery, PlatformClient, Record};
use crate::config::{Config, Credentials};
use crate::http::{build_http_client, send, RequestBuilderExt, ResponseExt};
use crate::options::TransportOptions;

const TABLE_API: &str = "api/now/table";

/// ServiceNow client using HTTP transport.
#[derive(Debug, Clone)]
pub struct ServiceNowClient {
    base_url: String,
    authorization: HeaderValue,
    http: reqwest::Client,
}

impl ServiceNowClient {
    /// Create a client for `instance_url`, e.g. `https://dev12345.service-now.com`.
    pub fn new(
        instance_url: impl Into<String>,
        credentials: &Credentials,
        transport_options: TransportOptions,
    ) -> Result<Self, ClientError> {
        let token = BASE64_STANDARD.encode(format!(
            "{}:{}",
            credentials.username, credentials.password
        ));
        let mut authorization = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| ClientError::Config(format!("invalid credentials: {e}")))?;
        authorization.set_sensitive(true);

        Ok(Self {
            base_url: instance_url.into().trim_end_matches('/').to_string(),
            authorization,
            http: build_http_client(&transport_options)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            config.instance_url.clone(),
            &config.credentials,
            config.transport_options(),
        )
    }

    /// Resource URL for a table, or for one record in it.
    pub fn table_url(&self, table: &str, sys_id: Option<&str>) -> String {
        match sys_id {
            Some(id) => format!("{}/{}/{}/{}", self.base_url, TABLE_API, table, id),
            None => format!("{}/{}/{}", self.base_url, TABLE_API, table),
        }
    }

    /// Issue one request and unwrap the `result` envelope.
    ///
    /// `target` names the record the request addresses; a 404 for it becomes
    /// [`ClientError::NotFound`].
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<&Fields>,
        query: &[(&str, String)],
        target: Option<(&str, &str)>,
    ) -> Result<T, ClientError> {
        tracing::debug!(%method, %url, "servicenow request");

        let mut req = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(fields) = body {
            req = req.json_logged(fields);
        }

        let response = send(req, &url).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body, target));
        }

        let envelope: Envelope<T> = response.json_logged().await?;
        Ok(envelope.result)
    }

    /// Map a failure status to a client error, keeping the platform's message.
    fn handle_error_response(
        status: StatusCode,
        body: &str,
        target: Option<(&str, &str)>,
    ) -> ClientError {
        let message = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => match error.detail.filter(|d| !d.is_empty()) {
                Some(detail) => format!("{} ({})", error.message, detail),
                None => error.message,
            },
            Err(_) if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            Err(_) => body.to_string(),
        };

        match (status, target) {
            (StatusCode::NOT_FOUND, Some((table, id))) => ClientError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
                message,
            },
            _ => ClientError::Remote {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl PlatformClient for ServiceNowClient {
    async fn create(&self, table: &str, fields: Fields) -> Result<Record, ClientError> {
        let url = self.table_url(table, None);
        self.execute(Method::POST, url, Some(&fields), &[], None)
            .await
    }

    async fn update(
        &self,
        table: &str,
        sys_id: &str,
        fields: Fields,
    ) -> Result<Record, ClientError> {
        let url = self.table_url(table, Some(sys_id));
        self.execute(Method::PATCH, url, Some(&fields), &[], Some((table, sys_id)))
            .await
    }

    async fn get(&self, table: &str, sys_id: &str) -> Result<Record, ClientError> {
        let url = self.table_url(table, Some(sys_id));
        self.execute(Method::GET, url, None, &[], Some((table, sys_id)))
            .await
    }

    async fn list(&self, table: &str, query: &ListQuery) -> Result<Vec<Record>, ClientError> {
        let url = self.table_url(table, None);
        let mut params = Vec::new();
        if let Some(q) = &query.query {
            params.push(("sysparm_query", q.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("sysparm_limit", limit.to_string()));
        }
        self.execute(Method::GET, url, None, &params, None).await
    }
}

// --- ServiceNow API envelope types ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceNowError,
}

#[derive(Debug, Deserialize)]
struct ServiceNowError {
    message: String,
    detail: Option<String>,
}
