//! Chat completion transport over HTTP

use super::client::join_url;
use super::error::{map_http_error, parse_retry_after};
use crate::config::SecretString;
use crate::protocol::types::{BatchRequest, ChatResponse};
use crate::providers::adapter::{BatchTransport, TextStream};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default base URL of the chat completion API
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// [`BatchTransport`] that POSTs to `{base_url}/chat/completions`
pub struct OpenAiTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiTransport {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    async fn post(&self, request: &BatchRequest) -> ProviderResult<Response> {
        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            model = %request.model,
            stream = request.stream,
            "POST chat completions"
        );

        let response = self
            .client
            .post(join_url(&self.base_url, CHAT_COMPLETIONS_PATH))
            .bearer_auth(self.api_key.expose_secret())
            .header("X-Request-ID", request_id.to_string())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.ok();
        warn!(%request_id, status = status.as_u16(), "Chat completion request failed");

        Err(map_http_error(status, body, retry_after, request_id))
    }
}

#[async_trait]
impl BatchTransport for OpenAiTransport {
    async fn create(&self, request: &BatchRequest) -> ProviderResult<ChatResponse> {
        let response = self.post(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn create_stream(&self, request: &BatchRequest) -> ProviderResult<TextStream> {
        let response = self.post(request).await?;
        let events = response.bytes_stream().eventsource();

        Ok(Box::pin(events.filter_map(|result| async move {
            match result {
                Ok(event) => {
                    if event.data == "[DONE]" {
                        return None;
                    }
                    match serde_json::from_str::<StreamChunk>(&event.data) {
                        Ok(chunk) => chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content)
                            .map(Ok),
                        Err(e) => Some(Err(ProviderError::Parse(format!(
                            "Invalid stream chunk: {}",
                            e
                        )))),
                    }
                }
                Err(e) => Some(Err(ProviderError::Transport(format!("Stream error: {}", e)))),
            }
        })))
    }
}
