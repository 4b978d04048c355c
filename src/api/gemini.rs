//! Google Gemini API client implementation.
//!
//! Only the non-streaming `generateContent` call is used: one prompt in, the
//! concatenated text of the first candidate out.
//! See: <https://ai.google.dev/api/rest>

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::client::ClientError;
use crate::config::GeminiSettings;
use crate::extract::TextGenerator;
use crate::http::{build_http_client, send, RequestBuilderExt, ResponseExt};
use crate::options::{ModelOptions, TransportOptions};

/// Gemini client using HTTP transport.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model_options: ModelOptions,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(
        api_key: String,
        base_url: String,
        model_options: ModelOptions,
        transport_options: TransportOptions,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_options,
            http: build_http_client(&transport_options)?,
        })
    }

    /// Client configured for structured extraction (JSON output, temperature 0).
    pub fn from_settings(
        settings: &GeminiSettings,
        transport_options: TransportOptions,
    ) -> Result<Self, ClientError> {
        Self::new(
            settings.api_key.clone(),
            settings.base_url.clone(),
            ModelOptions::for_extraction(settings.model.clone()),
            transport_options,
        )
    }

    pub fn model_options(&self) -> &ModelOptions {
        &self.model_options
    }

    /// Handle Gemini error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        let message = match serde_json::from_str::<GeminiErrorResponse>(body) {
            Ok(error_resp) => format!("Gemini error ({}): {}", error_resp.error.code, error_resp.error.message),
            Err(_) => body.to_string(),
        };
        ClientError::Remote {
            status: status.as_u16(),
            message,
        }
    }
}

impl GeminiRequest {
    fn new(prompt: &str, model_options: &ModelOptions) -> Self {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some(GeminiRole::User),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                    thought: None,
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: model_options.temperature,
                response_mime_type: model_options.response_mime_type.clone(),
            }),
        }
    }
}

impl GeminiResponse {
    /// Text of the first candidate, thought parts excluded.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought.unwrap_or_default())
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model_options.model
        );

        let request_body = GeminiRequest::new(prompt, &self.model_options);

        let req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json_logged(&request_body);

        let response = send(req, &url).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        let gemini_response: GeminiResponse = response.json_logged().await?;
        if let Some(reason) = gemini_response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            tracing::debug!(finish_reason = reason, "gemini candidate finished");
        }
        Ok(gemini_response.into_text())
    }
}

// --- Gemini API Request/Response Types ---

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum GeminiRole {
    User,
    Model,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    role: Option<GeminiRole>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
    thought: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: Option<f32>,
    response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiError {
    code: u32,
    message: String,
}
