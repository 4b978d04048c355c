//! Platform client trait and transport error types.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field name to value mapping sent as a record body.
pub type Fields = Map<String, Value>;

/// A record as returned by the platform (`number`, `sys_id`, ...).
pub type Record = Map<String, Value>;

/// Errors that can occur while talking to a remote HTTP service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[error("could not reach {url}: {source}")]
    Connectivity {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered with a 4xx/5xx status.
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// A 404 for a specific record identifier.
    #[error("no {table} record matches {id}")]
    NotFound {
        table: String,
        id: String,
        message: String,
    },

    /// A lookup by a non-key field found no record. The remote answered
    /// successfully, so no status is attached.
    #[error("no {table} record with {field} {value}")]
    NoMatch {
        table: String,
        field: &'static str,
        value: String,
    },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// True for every error where the remote responded with a failure status.
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Remote { .. } | ClientError::NotFound { .. })
    }
}

/// Query parameters for listing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Encoded query, e.g. `priority=1^state=2`.
    pub query: Option<String>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Thin, authenticated access to the platform's table API.
///
/// Implementations perform no validation of their own; whatever the remote
/// rejects is surfaced as a [`ClientError`].
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Create a record in `table`.
    async fn create(&self, table: &str, fields: Fields) -> Result<Record, ClientError>;

    /// Patch the record `sys_id` in `table`.
    async fn update(&self, table: &str, sys_id: &str, fields: Fields)
        -> Result<Record, ClientError>;

    /// Fetch a single record.
    async fn get(&self, table: &str, sys_id: &str) -> Result<Record, ClientError>;

    /// List records matching `query`.
    async fn list(&self, table: &str, query: &ListQuery) -> Result<Vec<Record>, ClientError>;
}
