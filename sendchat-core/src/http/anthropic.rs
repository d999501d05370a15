//! Streaming completion transport over HTTP

use super::client::join_url;
use crate::config::SecretString;
use crate::protocol::types::{CompletionChunk, CompletionRequest};
use crate::providers::adapter::{CompletionStream, StreamingTransport};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default base URL of the completion API
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const COMPLETE_PATH: &str = "/v1/complete";
const COUNT_TOKENS_PATH: &str = "/v1/messages/count_tokens";

#[derive(Debug, Deserialize)]
struct TokenCount {
    input_tokens: usize,
}

/// [`StreamingTransport`] that POSTs to `{base_url}/v1/complete`
pub struct AnthropicTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl AnthropicTransport {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    /// Non-success responses become a status error carrying the body
    async fn check_status(response: Response, request_id: Uuid) -> ProviderResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%request_id, status = status.as_u16(), "Completion request failed");
        Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Decode one server-sent event; `None` for events that carry no text
fn decode_event(event: &str, data: &str) -> Option<ProviderResult<CompletionChunk>> {
    match event {
        "ping" => None,
        "error" => Some(Err(ProviderError::Provider(data.to_string()))),
        "completion" | "message" | "" => match serde_json::from_str::<CompletionChunk>(data) {
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => Some(Err(ProviderError::Parse(format!(
                "Invalid completion event: {}",
                e
            )))),
        },
        other => {
            debug!(event = other, "Ignoring unknown stream event");
            None
        }
    }
}

#[async_trait]
impl StreamingTransport for AnthropicTransport {
    async fn open_stream(&self, request: &CompletionRequest) -> ProviderResult<CompletionStream> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, model = %request.model, "POST completion stream");

        let mut builder = self
            .authorized(self.client.post(join_url(&self.base_url, COMPLETE_PATH)))
            .header("accept", "text/event-stream");
        for (name, value) in &request.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.json(request).send().await?;
        let response = Self::check_status(response, request_id).await?;

        let events = response.bytes_stream().eventsource();
        Ok(Box::pin(events.filter_map(|result| async move {
            match result {
                Ok(event) => decode_event(&event.event, &event.data),
                Err(e) => Some(Err(ProviderError::Transport(format!("Stream error: {}", e)))),
            }
        })))
    }

    async fn count_tokens(&self, model: &str, text: &str) -> ProviderResult<usize> {
        let request_id = Uuid::new_v4();
        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": text}],
        });

        let response = self
            .authorized(self.client.post(join_url(&self.base_url, COUNT_TOKENS_PATH)))
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response, request_id).await?;

        let count: TokenCount = serde_json::from_str(&response.text().await?)?;
        Ok(count.input_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_completion_event() {
        let chunk = decode_event("completion", r#"{"completion": " Hello", "stop_reason": null}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.completion, " Hello");
    }

    #[test]
    fn test_decode_ping_and_unknown_events() {
        assert!(decode_event("ping", "{}").is_none());
        assert!(decode_event("message_start", "{}").is_none());
    }

    #[test]
    fn test_decode_error_event() {
        let err = decode_event("error", r#"{"error": {"type": "overloaded_error"}}"#)
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ProviderError::Provider(body) if body.contains("overloaded_error")));
    }
}
