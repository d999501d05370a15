//! Errors raised while loading and validating configuration

use super::schema::CONFIG_VERSION;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure to turn a configuration file into a usable [`SendchatConfig`]
///
/// [`SendchatConfig`]: super::SendchatConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} syntax error in '{path}'{}: {message}", location(.line, .column))]
    Syntax {
        path: String,
        format: &'static str,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("config references ${{{var}}} but it is not set")]
    MissingEnvVar { var: String },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(" at {line}:{column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

/// A setting that parsed but cannot be used
#[derive(Debug, Error)]
#[error("invalid setting '{field}': {kind}")]
pub struct ValidationError {
    /// Dotted path of the offending setting, e.g. `retry.max_attempts`
    pub field: String,
    pub kind: ValidationErrorKind,
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("{0}")]
    OutOfRange(String),

    #[error("'{url}' is not a usable base URL ({reason})")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported config version '{found}', expected '{}'", CONFIG_VERSION)]
    UnsupportedVersion { found: String },
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::OutOfRange(message.into()))
    }

    pub fn invalid_url(
        field: impl Into<String>,
        url: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidUrl {
                url: url.into(),
                reason: reason.into(),
            },
        )
    }
}
