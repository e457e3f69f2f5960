//! Errors raised while loading or checking a client configuration

use std::fmt;
use thiserror::Error;

/// Why a configuration file could not become a usable [`ClientConfig`]
///
/// [`ClientConfig`]: super::ClientConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("config rejected: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("config references unset variable ${{{var}}}")]
    EnvVarNotFound { var: String },

    #[error("config unusable: {message}")]
    Invalid { message: String },
}

/// A single rejected setting
#[derive(Debug, Error)]
pub struct ValidationError {
    /// Setting name as written in the file, such as `base_url`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// Offending value or hint, shown in parentheses
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("missing")]
    RequiredFieldMissing,

    #[error("expected {expected}, found {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("out of range, {message}")]
    OutOfRange { message: String },

    #[error("not a usable service URL, {message}")]
    InvalidUrl { message: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn invalid_value(
        field_path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidValue {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    /// A `base_url` that is not plain `https://host[:port]`
    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidUrl {
                message: message.into(),
            },
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
