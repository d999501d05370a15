//! Provider error types and classification

use crate::prompt::TranscriptError;
use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when calling an LLM provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Generic API error reported by the provider
    #[error("API error: {0}")]
    Api(String),

    /// Provider temporarily unavailable
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Could not reach the provider
    #[error("Connection error: {0}")]
    Connection(String),

    /// Lower-level transport failure while sending or reading
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request rejected as invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-success HTTP status from a streaming endpoint, with its body
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider-level failure carrying the provider's own message
    #[error("Provider error: {0}")]
    Provider(String),

    /// Response could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Prompt could not be converted
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// Missing credentials or invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Transient errors that the retry policy may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::Api(_)
                | Self::ServiceUnavailable(_)
                | Self::RateLimit { .. }
                | Self::Connection(_)
                | Self::Transport(_)
        )
    }

    /// Short, stable name of the error class, used in retry diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "Timeout",
            Self::Api(_) => "APIError",
            Self::ServiceUnavailable(_) => "ServiceUnavailableError",
            Self::RateLimit { .. } => "RateLimitError",
            Self::Connection(_) => "APIConnectionError",
            Self::Transport(_) => "ConnectionError",
            Self::InvalidRequest(_) => "InvalidRequestError",
            Self::Authentication(_) => "AuthenticationError",
            Self::Status { .. } => "APIStatusError",
            Self::Provider(_) => "ProviderError",
            Self::Parse(_) => "ParseError",
            Self::Transcript(_) => "TranscriptError",
            Self::Configuration(_) => "ConfigurationError",
        }
    }

    /// Server-suggested delay before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ProviderError::InvalidRequest(err.to_string())
        } else if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_connect() {
            ProviderError::Connection(err.to_string())
        } else if err.is_request() || err.is_body() {
            ProviderError::Transport(err.to_string())
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Api(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
