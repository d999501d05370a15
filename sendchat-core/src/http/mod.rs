//! HTTP transports for the two provider styles
//!
//! These are the reqwest-backed implementations of [`BatchTransport`] and
//! [`StreamingTransport`]. The providers only see the traits.
//!
//! [`BatchTransport`]: crate::providers::BatchTransport
//! [`StreamingTransport`]: crate::providers::StreamingTransport

pub mod anthropic;
pub mod client;
pub mod error;
pub mod openai;

pub use anthropic::{AnthropicTransport, ANTHROPIC_VERSION, DEFAULT_ANTHROPIC_BASE_URL};
pub use client::{build_client, USER_AGENT};
pub use error::{map_http_error, parse_retry_after};
pub use openai::{OpenAiTransport, DEFAULT_OPENAI_BASE_URL};
