//! Sendchat Core Library
//!
//! Sends chat conversations to hosted language model providers. A
//! [`Dispatcher`] picks the provider whose credential is configured, each
//! provider retries transient failures with exponential backoff, and the
//! batch provider can serve repeated requests from a [`ResponseCache`].
//!
//! ```no_run
//! use sendchat_core::{Dispatcher, Message};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::from_env()?;
//! let reply = dispatcher
//!     .simple_send("claude-2", &[Message::user("Hello")])
//!     .await?;
//! println!("{}", reply.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod prompt;
pub mod protocol;
pub mod providers;

pub use cache::{RequestFingerprint, ResponseCache};
pub use config::{ConfigError, SendchatConfig};
pub use prompt::{PromptConverter, TranscriptError, UnknownRolePolicy};
pub use protocol::{BatchRequest, ChatResponse, Conversation, Message, MessageRole};
pub use providers::{
    BatchProvider, Credentials, Dispatcher, ProviderClient, ProviderError, ProviderResponse,
    ProviderResult, RetryPolicy, SendOutcome, StreamingProvider,
};

/// Returns the version of the Sendchat Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
