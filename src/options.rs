//! Options for the generative model and the HTTP transport.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::time::Duration;

use crate::config::DEFAULT_TIMEOUT;

/// Model behavior parameters sent with every extraction request.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Model identifier (e.g., "gemini-1.5-flash").
    pub model: String,

    /// Temperature for sampling (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// MIME type the model is asked to answer in, e.g. `application/json`.
    pub response_mime_type: Option<String>,
}

impl ModelOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            response_mime_type: None,
        }
    }

    /// Options tuned for field extraction: deterministic, JSON output.
    pub fn for_extraction(model: impl Into<String>) -> Self {
        Self {
            temperature: Some(0.0),
            response_mime_type: Some("application/json".to_string()),
            ..Self::new(model)
        }
    }
}

/// Transport configuration options.
///
/// Controls how requests are sent over the network.
#[derive(Debug, Clone)]
pub enum TransportOptions {
    Http {
        /// Request timeout. If None, the reqwest default (no timeout) applies.
        timeout: Option<Duration>,
        /// Proxy URL for every outbound request.
        proxy: Option<String>,
    },
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions::Http {
            timeout: Some(DEFAULT_TIMEOUT),
            proxy: None,
        }
    }
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        match &mut self {
            TransportOptions::Http { timeout, .. } => *timeout = Some(duration),
        }
        self
    }

    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        match &mut self {
            TransportOptions::Http { proxy, .. } => *proxy = Some(proxy_url),
        }
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self {
            TransportOptions::Http { timeout, .. } => *timeout,
        }
    }

    pub fn proxy(&self) -> Option<&str> {
        match self {
            TransportOptions::Http { proxy, .. } => proxy.as_deref(),
        }
    }
}
