//! Turning free text into record fields with a generative model.
//!
//! Each extraction is one model round trip. The reply must be a JSON object
//! (optionally wrapped in a Markdown code fence); anything else is an
//! [`ExtractionError`] and nothing is written to the platform.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::client::ClientError;
use crate::model::{IncidentArgs, KbArticleArgs, WorkflowState, DEFAULT_KB_AUDIENCE};

/// Longest KB title kept from the model's suggestion, in characters.
pub const MAX_KB_TITLE_CHARS: usize = 60;

/// A prompt-in, text-out generative model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError>;
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("the language model is not configured; set GEMINI_API_KEY")]
    NotConfigured,

    #[error("language model request failed: {0}")]
    Request(#[from] ClientError),

    #[error("language model returned no text")]
    Empty,

    #[error("could not parse language model output: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("language model output has no `{0}`")]
    MissingField(&'static str),
}

impl ExtractionError {
    /// The model's raw reply, when one was received but could not be used.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractionError::Malformed { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Incident fields as the model reports them. Any field may be absent and
/// scalar values may come back as numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedIncident {
    #[serde(default, deserialize_with = "lenient_string")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub urgency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub impact: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
}

impl ExtractedIncident {
    /// Convert into the structured tool's arguments so shaping is shared.
    pub fn into_args(self) -> Result<IncidentArgs, ExtractionError> {
        let short_description = self
            .short_description
            .ok_or(ExtractionError::MissingField("short_description"))?;
        Ok(IncidentArgs {
            short_description,
            description: self.description,
            urgency: self.urgency,
            impact: self.impact,
            priority: self.priority,
            category: self.category,
            caller_id: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub body_html: Option<String>,
}

impl ExtractedArticle {
    /// Convert into draft KB article arguments.
    pub fn into_args(self, kb_knowledge_base: Option<String>) -> Result<KbArticleArgs, ExtractionError> {
        let title = self.title.ok_or(ExtractionError::MissingField("title"))?;
        let body = self
            .body_html
            .ok_or(ExtractionError::MissingField("body_html"))?;
        Ok(KbArticleArgs {
            short_description: clean_title(&title),
            article_body: body,
            workflow_state: Some(WorkflowState::Draft),
            kb_knowledge_base,
        })
    }
}

/// Strip quotes and clamp to [`MAX_KB_TITLE_CHARS`].
pub fn clean_title(raw: &str) -> String {
    let unquoted: String = raw.chars().filter(|c| *c != '"').collect();
    unquoted.trim().chars().take(MAX_KB_TITLE_CHARS).collect::<String>().trim_end().to_string()
}

/// Accept strings, numbers and booleans; blank strings and null become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // Skip the info string (e.g. `json`) up to the end of the line.
    let body = match after_fence.find('\n') {
        Some(nl) => &after_fence[nl + 1..],
        None => after_fence,
    };
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse a model reply as JSON of type `T`.
///
/// A reply that is already valid JSON is taken as is, so fences inside string
/// values survive. Otherwise the first fenced block is parsed.
pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractionError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Ok(value);
        }
    }
    let body = strip_code_fence(trimmed);
    if body.is_empty() {
        return Err(ExtractionError::Empty);
    }
    serde_json::from_str(body).map_err(|source| ExtractionError::Malformed {
        source,
        raw: raw.to_string(),
    })
}

pub fn incident_prompt(text: &str) -> String {
    format!(
        "Analyze the following issue report and extract structured details for a ServiceNow incident.\n\
         Output ONLY a JSON object with these keys: short_description, description, \
         urgency (1, 2, or 3), impact (1, 2, or 3), priority (1 to 5), category \
         (e.g. database, network, hardware, software, inquiry).\n\
         Default to urgency 3 and impact 3 if not clear. Omit keys you cannot infer.\n\n\
         Report:\n{text}\n"
    )
}

pub fn kb_prompt(source: &str, audience: &str) -> String {
    format!(
        "Convert the following content into a professional ServiceNow Knowledge Base article.\n\
         Output ONLY a JSON object with two keys:\n\
         - title: a short, concise title of at most {MAX_KB_TITLE_CHARS} characters\n\
         - body_html: the article body in HTML with a clear structure (h1, p, ul/li)\n\n\
         Target Audience: {audience}\n\
         Source:\n{source}\n"
    )
}

/// Extraction front end over an optional generator.
#[derive(Debug, Clone)]
pub struct Extractor<G> {
    generator: Option<G>,
}

impl<G: TextGenerator> Extractor<G> {
    pub fn new(generator: Option<G>) -> Self {
        Self { generator }
    }

    async fn ask(&self, prompt: &str) -> Result<String, ExtractionError> {
        let generator = self.generator.as_ref().ok_or(ExtractionError::NotConfigured)?;
        let reply = generator.generate(prompt).await?;
        if reply.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(reply)
    }

    /// Extract incident fields from a free-text report.
    pub async fn extract_incident(&self, text: &str) -> Result<ExtractedIncident, ExtractionError> {
        let reply = self.ask(&incident_prompt(text)).await?;
        parse_reply(&reply)
    }

    /// Draft a KB article (title and HTML body) from raw notes.
    pub async fn draft_article(
        &self,
        source: &str,
        audience: Option<&str>,
    ) -> Result<ExtractedArticle, ExtractionError> {
        let audience = audience.unwrap_or(DEFAULT_KB_AUDIENCE);
        let reply = self.ask(&kb_prompt(source, audience)).await?;
        parse_reply(&reply)
    }
}
