//! Provider client trait and transport seams
//!
//! A [`ProviderClient`] owns the retry policy and the request shape for one
//! provider style. The actual remote call goes through a transport trait so
//! the HTTP layer can be swapped out in tests.

use crate::cache::RequestFingerprint;
use crate::protocol::types::{
    BatchRequest, ChatResponse, CompletionChunk, CompletionRequest, Message,
};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;

/// Stream of text deltas
pub type TextStream = Pin<Box<dyn Stream<Item = ProviderResult<String>> + Send>>;

/// Stream of completion fragments from a streaming endpoint
pub type CompletionStream = Pin<Box<dyn Stream<Item = ProviderResult<CompletionChunk>> + Send>>;

/// Remote side of a batch (chat completion) provider
#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// Perform one non-streaming call
    async fn create(&self, request: &BatchRequest) -> ProviderResult<ChatResponse>;

    /// Open one streaming call, yielding content deltas
    async fn create_stream(&self, request: &BatchRequest) -> ProviderResult<TextStream>;
}

/// Remote side of a streaming (transcript completion) provider
#[async_trait]
pub trait StreamingTransport: Send + Sync {
    /// Open a completion stream
    async fn open_stream(&self, request: &CompletionRequest) -> ProviderResult<CompletionStream>;

    /// Count the tokens in `text`
    async fn count_tokens(&self, model: &str, text: &str) -> ProviderResult<usize>;
}

/// Response returned by a provider call
pub enum ProviderResponse {
    /// Complete response of a non-streaming batch call
    Completion(ChatResponse),
    /// Live deltas of a streaming batch call
    Stream(TextStream),
    /// Accumulated text of a streaming provider call
    Text(String),
}

impl ProviderResponse {
    /// Text of the response, when it is already complete
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Completion(response) => response.first_content(),
            Self::Text(text) => Some(text.as_str()),
            Self::Stream(_) => None,
        }
    }

    pub fn into_completion(self) -> Option<ChatResponse> {
        match self {
            Self::Completion(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<TextStream> {
        match self {
            Self::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl fmt::Debug for ProviderResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completion(response) => f.debug_tuple("Completion").field(response).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// Result of `send_with_retries`: the cache key (when one applies) and the response
#[derive(Debug)]
pub struct SendOutcome {
    pub fingerprint: Option<RequestFingerprint>,
    pub response: ProviderResponse,
}

/// Common call surface of every provider
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Send a conversation, retrying transient failures
    async fn send_with_retries(
        &self,
        model: &str,
        conversation: &[Message],
        tools: Option<&[Value]>,
        stream: bool,
    ) -> ProviderResult<SendOutcome>;

    /// Send without tools or streaming and return just the reply text.
    ///
    /// Invalid requests and responses without content yield `Ok(None)`.
    async fn simple_send(&self, model: &str, conversation: &[Message])
        -> ProviderResult<Option<String>>;
}
