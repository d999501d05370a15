//! Batch provider: role-tagged chat completions with caching and retries

use crate::cache::{RequestFingerprint, ResponseCache};
use crate::protocol::types::{BatchRequest, Message};
use crate::providers::adapter::{
    BatchTransport, ProviderClient, ProviderResponse, SendOutcome,
};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::retry::{RetryExecutor, RetryPolicy};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Provider for chat completion endpoints that return one response per call
pub struct BatchProvider {
    transport: Arc<dyn BatchTransport>,
    cache: ResponseCache,
    retry: RetryExecutor,
    temperature: f32,
    deployment_id: Option<String>,
    engine: Option<String>,
}

impl BatchProvider {
    pub const NAME: &'static str = "openai";

    /// Create a provider with the default retry policy and caching disabled
    pub fn new(transport: Arc<dyn BatchTransport>) -> Self {
        Self {
            transport,
            cache: ResponseCache::disabled(),
            retry: RetryExecutor::new(RetryPolicy::default()).with_label(Self::NAME),
            temperature: 0.0,
            deployment_id: None,
            engine: None,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryExecutor::new(policy).with_label(Self::NAME);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_deployment_id(mut self, deployment_id: Option<String>) -> Self {
        self.deployment_id = deployment_id;
        self
    }

    pub fn with_engine(mut self, engine: Option<String>) -> Self {
        self.engine = engine;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Request body for a call
    pub fn build_request(
        &self,
        model: &str,
        conversation: &[Message],
        tools: Option<&[Value]>,
        stream: bool,
    ) -> BatchRequest {
        BatchRequest::new(model, conversation.to_vec(), stream)
            .with_temperature(self.temperature)
            .with_functions(tools.map(<[Value]>::to_vec))
            .with_deployment_id(self.deployment_id.clone())
            .with_engine(self.engine.clone())
    }
}

#[async_trait]
impl ProviderClient for BatchProvider {
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
        let request = self.build_request(model, conversation, tools, stream);

        if stream {
            info!(provider = Self::NAME, model, "Opening streaming chat completion");
            let deltas = self
                .retry
                .execute(|| self.transport.create_stream(&request))
                .await?;
            return Ok(SendOutcome {
                fingerprint: None,
                response: ProviderResponse::Stream(deltas),
            });
        }

        let fingerprint = RequestFingerprint::compute(&request);

        if let Some(fp) = fingerprint.as_ref() {
            if let Some(cached) = self.cache.get(fp) {
                return Ok(SendOutcome {
                    fingerprint,
                    response: ProviderResponse::Completion(cached),
                });
            }
        }

        info!(
            provider = Self::NAME,
            model,
            messages = request.messages.len(),
            "Sending chat completion"
        );
        let response = self.retry.execute(|| self.transport.create(&request)).await?;

        if let Some(fp) = fingerprint {
            self.cache.put(fp, response.clone());
        }

        Ok(SendOutcome {
            fingerprint,
            response: ProviderResponse::Completion(response),
        })
    }

    async fn simple_send(
        &self,
        model: &str,
        conversation: &[Message],
    ) -> ProviderResult<Option<String>> {
        match self.send_with_retries(model, conversation, None, false).await {
            Ok(outcome) => {
                let content = outcome.response.content().map(str::to_string);
                if content.is_none() {
                    debug!(provider = Self::NAME, model, "Response carried no message content");
                }
                Ok(content)
            }
            Err(ProviderError::InvalidRequest(message)) => {
                warn!(provider = Self::NAME, model, %message, "Request rejected as invalid");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
