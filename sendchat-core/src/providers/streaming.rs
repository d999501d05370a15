//! Streaming provider: transcript prompts consumed fragment by fragment

use crate::prompt::PromptConverter;
use crate::protocol::types::{CompletionRequest, Message};
use crate::providers::adapter::{
    ProviderClient, ProviderResponse, SendOutcome, StreamingTransport, TextStream,
};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::retry::{RetryExecutor, RetryPolicy};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Output budget requested on every streaming call
pub const DEFAULT_MAX_TOKENS_TO_SAMPLE: u32 = 90_000;

/// Whether `model` names a model the streaming endpoint serves
pub fn is_claude_model(model: &str) -> bool {
    model.starts_with("claude")
}

/// Concatenate a text stream in arrival order.
///
/// A stream that ends early (for example because its handle was closed)
/// yields the text received so far.
pub async fn collect_completion(mut stream: TextStream) -> ProviderResult<String> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

/// Status errors surface as provider errors carrying the response body
fn reraise_status(err: ProviderError) -> ProviderError {
    match err {
        ProviderError::Status { status, body } => {
            error!(status, body = %body, "Caught API status error with response body");
            ProviderError::Provider(body)
        }
        other => other,
    }
}

/// Provider for completion endpoints that stream a transcript completion
pub struct StreamingProvider {
    transport: Arc<dyn StreamingTransport>,
    converter: PromptConverter,
    retry: RetryExecutor,
    max_tokens_to_sample: u32,
    extra_headers: HashMap<String, String>,
}

impl StreamingProvider {
    pub const NAME: &'static str = "anthropic";

    pub fn new(transport: Arc<dyn StreamingTransport>) -> Self {
        Self {
            transport,
            converter: PromptConverter::new(),
            retry: RetryExecutor::new(RetryPolicy::default()).with_label(Self::NAME),
            max_tokens_to_sample: DEFAULT_MAX_TOKENS_TO_SAMPLE,
            extra_headers: HashMap::new(),
        }
    }

    pub fn with_converter(mut self, converter: PromptConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryExecutor::new(policy).with_label(Self::NAME);
        self
    }

    pub fn with_max_tokens_to_sample(mut self, max_tokens: u32) -> Self {
        self.max_tokens_to_sample = max_tokens;
        self
    }

    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = headers;
        self
    }

    /// Request body for a call; fails on an empty prompt
    pub fn build_request(
        &self,
        model: &str,
        conversation: &[Message],
    ) -> ProviderResult<CompletionRequest> {
        let prompt = self.converter.to_transcript(conversation)?;
        if prompt.trim().is_empty() {
            return Err(ProviderError::InvalidRequest(
                "Prompt cannot be empty".to_string(),
            ));
        }

        Ok(CompletionRequest {
            model: model.to_string(),
            prompt,
            max_tokens_to_sample: self.max_tokens_to_sample,
            stream: true,
            extra_headers: self.extra_headers.clone(),
        })
    }

    /// Open the completion and return its fragments as they arrive.
    ///
    /// Dropping the returned stream closes the underlying connection.
    pub async fn stream(&self, model: &str, conversation: &[Message]) -> ProviderResult<TextStream> {
        if !is_claude_model(model) {
            warn!(
                provider = Self::NAME,
                model, "Model is not served by the streaming provider it was routed to"
            );
        }

        let request = self.build_request(model, conversation)?;
        info!(
            provider = Self::NAME,
            model,
            prompt_chars = request.prompt.len(),
            "Opening completion stream"
        );

        let chunks = self
            .retry
            .execute(|| self.transport.open_stream(&request))
            .await
            .map_err(reraise_status)?;

        Ok(Box::pin(chunks.map(|item| {
            item.map(|chunk| chunk.completion).map_err(reraise_status)
        })))
    }

    /// Token count of `text` as reported by the provider
    pub async fn count_tokens(&self, model: &str, text: &str) -> ProviderResult<usize> {
        let tokens = self.transport.count_tokens(model, text).await?;
        debug!(provider = Self::NAME, model, tokens, "Counted tokens");
        Ok(tokens)
    }
}

#[async_trait]
impl ProviderClient for StreamingProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn send_with_retries(
        &self,
        model: &str,
        conversation: &[Message],
        tools: Option<&[Value]>,
        stream: bool,
    ) -> ProviderResult<SendOutcome> {
        if tools.is_some() {
            warn!(
                provider = Self::NAME,
                model, "Tools are not supported by transcript prompts and were ignored"
            );
        }
        if !stream {
            debug!(provider = Self::NAME, model, "Streaming provider always streams");
        }

        let fragments = self.stream(model, conversation).await?;
        let text = collect_completion(fragments).await?;

        Ok(SendOutcome {
            fingerprint: None,
            response: ProviderResponse::Text(text),
        })
    }

    async fn simple_send(
        &self,
        model: &str,
        conversation: &[Message],
    ) -> ProviderResult<Option<String>> {
        match self.send_with_retries(model, conversation, None, false).await {
            Ok(outcome) => Ok(outcome.response.content().map(str::to_string)),
            Err(ProviderError::InvalidRequest(message)) => {
                warn!(provider = Self::NAME, model, %message, "Request rejected as invalid");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
