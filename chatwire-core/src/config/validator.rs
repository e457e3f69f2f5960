//! Configuration validation utilities

use super::env::has_placeholder;
use super::error::ValidationError;
use super::schema::ClientConfig;
use url::Url;

/// Configuration validator with rules beyond the schema's own checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_placeholders(config)?;
        self.validate_base_url(config)?;

        Ok(())
    }

    /// Reject values that still carry an uninterpolated `${VAR}`
    fn validate_placeholders(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        if has_placeholder(config.api_key.expose_secret()) {
            return Err(ValidationError::invalid_value(
                "api_key",
                "a literal key",
                "an unresolved ${...} reference",
            ));
        }

        if has_placeholder(&config.base_url) {
            return Err(ValidationError::invalid_value(
                "base_url",
                "a literal URL",
                config.base_url.clone(),
            ));
        }

        Ok(())
    }

    /// The transport always speaks TLS to the root of a host
    fn validate_base_url(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| ValidationError::invalid_url("base_url", e.to_string()))?;

        if url.scheme() != "https" {
            return Err(ValidationError::invalid_value(
                "base_url",
                "https scheme",
                url.scheme().to_string(),
            ));
        }

        if url.host_str().is_none() {
            return Err(ValidationError::invalid_url("base_url", "URL has no host"));
        }

        if url.path() != "/" && !url.path().is_empty() {
            return Err(ValidationError::invalid_url(
                "base_url",
                format!("unexpected path '{}'", url.path()),
            )
            .with_context("request paths are fixed, e.g. /v1/chat/completions"));
        }

        Ok(())
    }
}
