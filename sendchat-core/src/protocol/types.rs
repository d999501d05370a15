//! Core protocol types for chat completion calls
//!
//! Two request shapes coexist here:
//! - [`BatchRequest`], the role-tagged message list sent to chat completion
//!   endpoints
//! - [`CompletionRequest`], the single transcript prompt sent to streaming
//!   completion endpoints
//!
//! Responses from the batch endpoint keep any field this crate does not model
//! so a cached response replays exactly what the provider returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
    /// Function call result
    Function,
    /// Tool response
    Tool,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
            Self::Tool => "tool",
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Ordered sequence of messages
pub type Conversation = Vec<Message>;

/// Request body for the batch (chat completion) endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Model identifier to use
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Whether the endpoint should stream deltas
    pub stream: bool,

    /// Function specifications made available to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<Value>>,

    /// Deployment identifier for deployment-addressed endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    /// Engine name for engine-addressed endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl BatchRequest {
    /// Create a deterministic (temperature 0) request
    pub fn new(model: impl Into<String>, messages: Vec<Message>, stream: bool) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.0,
            stream,
            functions: None,
            deployment_id: None,
            engine: None,
        }
    }

    pub fn with_functions(mut self, functions: Option<Vec<Value>>) -> Self {
        self.functions = functions;
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
}

/// Message returned inside a response choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Function call payload, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
}

/// A single completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseChoice {
    #[serde(default)]
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response body of the batch endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub choices: Vec<ResponseChoice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Fields not modelled above, preserved verbatim
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ChatResponse {
    /// Build a minimal response carrying one assistant message
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ResponseChoice {
                index: 0,
                message: Some(ResponseMessage {
                    role: Some(MessageRole::Assistant),
                    content: Some(content.into()),
                    function_call: None,
                }),
                finish_reason: Some("stop".to_string()),
            }],
            ..Default::default()
        }
    }

    /// Content of the first choice's message, if the response carries one
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }
}

/// Request body for the streaming completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,

    /// Transcript prompt
    pub prompt: String,

    pub max_tokens_to_sample: u32,

    pub stream: bool,

    /// Additional headers sent with the request, never serialized into the body
    #[serde(skip)]
    pub extra_headers: HashMap<String, String>,
}

/// One fragment of a streamed completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChunk {
    pub completion: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl CompletionChunk {
    pub fn new(completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            stop_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_content() {
        let response = ChatResponse::from_content("hello");
        assert_eq!(response.first_content(), Some("hello"));

        let empty = ChatResponse::default();
        assert_eq!(empty.first_content(), None);
    }

    #[test]
    fn test_chat_response_preserves_unknown_fields() {
        let raw = json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}}],
            "system_fingerprint": "fp_123"
        });

        let response: ChatResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(response.first_content(), Some("hi"));
        assert_eq!(response.extra.get("system_fingerprint"), Some(&json!("fp_123")));

        let back = serde_json::to_value(&response).unwrap();
        assert_eq!(back["system_fingerprint"], json!("fp_123"));
    }

    #[test]
    fn test_batch_request_omits_absent_functions() {
        let request = BatchRequest::new("gpt-4", vec![Message::user("hi")], false);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("functions").is_none());
        assert_eq!(value["temperature"], json!(0.0));
        assert_eq!(value["messages"][0]["role"], json!("user"));
    }

    #[test]
    fn test_completion_request_skips_headers() {
        let mut extra_headers = HashMap::new();
        extra_headers.insert("anthropic-beta".to_string(), "x".to_string());
        let request = CompletionRequest {
            model: "claude-2".to_string(),
            prompt: "Human:\n\nhi".to_string(),
            max_tokens_to_sample: 90_000,
            stream: true,
            extra_headers,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("extra_headers").is_none());
        assert_eq!(value["max_tokens_to_sample"], json!(90_000));
    }
}
