//! Protocol module for chat completion requests and responses
//!
//! Defines the message, request and response shapes shared by the
//! batch and streaming providers.

pub mod types;

pub use types::{
    BatchRequest, ChatResponse, CompletionChunk, CompletionRequest, Conversation, Message,
    MessageRole, ResponseChoice, ResponseMessage, Usage,
};
