//! Process configuration, read once at startup and passed explicitly into the
//! clients.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::options::TransportOptions;

pub const INSTANCE_VAR: &str = "SERVICENOW_INSTANCE";
pub const USERNAME_VAR: &str = "SERVICENOW_USERNAME";
pub const PASSWORD_VAR: &str = "SERVICENOW_PASSWORD";
pub const TIMEOUT_VAR: &str = "SERVICENOW_TIMEOUT_SECS";
pub const PROXY_VAR: &str = "MCP_SERVICENOW_PROXY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_VAR: &str = "GEMINI_MODEL";
pub const GEMINI_BASE_URL_VAR: &str = "GEMINI_BASE_URL";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Basic-auth credential pair for the ServiceNow instance.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for the Gemini extraction backend.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub instance_url: String,
    pub credentials: Credentials,
    /// `None` when no API key is set; the smart tools then refuse to run.
    pub gemini: Option<GeminiSettings>,
    pub timeout: Duration,
    /// Proxy for both the ServiceNow and the Gemini client.
    pub proxy: Option<String>,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as missing. Every missing required variable is
    /// reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let instance = get(INSTANCE_VAR);
        let username = get(USERNAME_VAR);
        let password = get(PASSWORD_VAR);

        let missing: Vec<&'static str> = [
            (INSTANCE_VAR, instance.is_none()),
            (USERNAME_VAR, username.is_none()),
            (PASSWORD_VAR, password.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(instance_url), Some(username), Some(password)) = (instance, username, password)
        else {
            return Err(ConfigError::Missing(missing));
        };

        if !instance_url.starts_with("http://") && !instance_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: INSTANCE_VAR,
                reason: format!("expected an http(s) URL, got `{instance_url}`"),
            });
        }

        let timeout = match get(TIMEOUT_VAR) {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: TIMEOUT_VAR,
                    reason: e.to_string(),
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let gemini = get(GEMINI_KEY_VAR).map(|api_key| GeminiSettings {
            api_key,
            model: get(GEMINI_MODEL_VAR).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: get(GEMINI_BASE_URL_VAR)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        });

        Ok(Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            credentials: Credentials::new(username, password),
            gemini,
            timeout,
            proxy: get(PROXY_VAR),
        })
    }

    /// Transport settings shared by every outbound client.
    pub fn transport_options(&self) -> TransportOptions {
        let options = TransportOptions::new().with_timeout(self.timeout);
        match &self.proxy {
            Some(proxy) => options.with_proxy(proxy.clone()),
            None => options,
        }
    }

    /// Names of the optional settings that are absent, for the startup log.
    pub fn missing_optional(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.gemini.is_none() {
            missing.push(GEMINI_KEY_VAR);
        }
        missing
    }
}
