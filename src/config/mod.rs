use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::Path;
use thiserror::Error;

/// Largest page the remote service hands out
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    #[error("Unable to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unable to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connector settings.
///
/// `api_key_id`, `api_key_secret`, `application_href` and `debug` are the options a
/// caller passes to `initialize`; the rest are tunables with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectorConfig {
    pub api_key_id: String,
    pub api_key_secret: String,
    pub application_href: String,
    pub debug: bool,
    /// Root used to rebuild account hrefs from ids; derived from the application href when empty
    pub base_url: String,
    pub page_size: usize,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            api_key_id: String::new(),
            api_key_secret: String::new(),
            application_href: String::new(),
            debug: false,
            base_url: String::new(),
            page_size: MAX_PAGE_SIZE,
            max_concurrency: 8,
            request_timeout_secs: 30,
        }
    }
}

impl ConnectorConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a YAML (or JSON) file with camelCase keys
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Build from the loosely-typed options object a host framework passes to `initialize`
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("CONNECTOR_API_KEY_ID") {
            self.api_key_id = v;
        }
        if let Ok(v) = env::var("CONNECTOR_API_KEY_SECRET") {
            self.api_key_secret = v;
        }
        if let Ok(v) = env::var("CONNECTOR_APPLICATION_HREF") {
            self.application_href = v;
        }
        if let Ok(v) = env::var("CONNECTOR_DEBUG") {
            self.debug = v.parse().unwrap_or(self.debug);
        }
        if let Ok(v) = env::var("CONNECTOR_BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = env::var("CONNECTOR_PAGE_SIZE") {
            self.page_size = v.parse().unwrap_or(self.page_size);
        }
        if let Ok(v) = env::var("CONNECTOR_MAX_CONCURRENCY") {
            self.max_concurrency = v.parse().unwrap_or(self.max_concurrency);
        }
        if let Ok(v) = env::var("CONNECTOR_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v.parse().unwrap_or(self.request_timeout_secs);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_href.trim().is_empty() {
            return Err(ConfigError::Missing("applicationHref"));
        }
        url::Url::parse(&self.application_href).map_err(|e| ConfigError::Invalid {
            field: "applicationHref",
            message: e.to_string(),
        })?;
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                field: "pageSize",
                message: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "maxConcurrency",
                message: "must be at least 1".to_string(),
            });
        }
        self.base_url()?;
        Ok(())
    }

    /// Service root, e.g. `https://api.example.com/v1`
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if !self.base_url.trim().is_empty() {
            return Ok(self.base_url.trim_end_matches('/').to_string());
        }
        match self.application_href.find("/applications/") {
            Some(index) => Ok(self.application_href[..index].to_string()),
            None => Err(ConfigError::Invalid {
                field: "baseUrl",
                message: "cannot be derived from applicationHref; set it explicitly".to_string(),
            }),
        }
    }

    /// Copy safe to print or log
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_key_secret.is_empty() {
            copy.api_key_secret = "********".to_string();
        }
        copy
    }
}
