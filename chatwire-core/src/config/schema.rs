//! Configuration schema structures with serde support

use super::error::{ConfigError, ValidationError};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Default service root
pub const DEFAULT_BASE_URL: &str = "https://api.x.ai";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "grok-beta";

/// Default socket read size for the response readers
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Configuration handed to the client at construction
///
/// Host, port and sampling temperature live here rather than in constants so
/// that tests and alternate deployments can point the client elsewhere.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Static bearer token sent with every request
    pub api_key: SecretString,

    /// Service root, e.g. `https://api.x.ai` (port defaults to 443)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when the caller does not name one
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; 0 selects deterministic sampling
    #[serde(default)]
    pub temperature: f32,

    /// Value of the `User-Agent` request header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra PEM bundle trusted in addition to the system roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,

    /// Bytes requested from the transport per read
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Host and port the transport connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Value for the `Host` header; the port is omitted when it is 443
    pub fn host_header(&self) -> String {
        if self.port == 443 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_user_agent() -> String {
    format!("chatwire/{}", env!("CARGO_PKG_VERSION"))
}

fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: 0.0,
            user_agent: default_user_agent(),
            ca_file: None,
            read_buffer_size: default_read_buffer_size(),
        }
    }

    /// Set the service root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the `User-Agent` header value
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Trust an extra PEM certificate bundle
    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Set the per-read buffer size
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Resolve the host and port from `base_url`
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::ValidationError(ValidationError::invalid_url("base_url", e.to_string()))
        })?;

        let host = url.host_str().ok_or_else(|| {
            ConfigError::ValidationError(ValidationError::invalid_url(
                "base_url",
                "URL has no host",
            ))
        })?;

        Ok(Endpoint {
            host: host.to_string(),
            port: url.port_or_known_default().unwrap_or(443),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::required("api_key"));
        }

        if self.model.trim().is_empty() {
            return Err(ValidationError::required("model"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                "temperature",
                format!("must be between 0.0 and 2.0, got {}", self.temperature),
            ));
        }

        if self.read_buffer_size == 0 {
            return Err(ValidationError::out_of_range(
                "read_buffer_size",
                "must be greater than 0",
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ValidationError::required("user_agent"));
        }

        Ok(())
    }
}
