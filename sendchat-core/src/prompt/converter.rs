//! Conversion between role-tagged conversations and transcript prompts

use crate::protocol::types::{Conversation, Message, MessageRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Delimiter that opens a human turn
pub const HUMAN_PROMPT: &str = "Human:\n\n";

/// Delimiter that opens an assistant turn
pub const AI_PROMPT: &str = "Assistant:\n\n";

/// Blank line separating a role header from its content and turns from each other
pub const TURN_SEPARATOR: &str = "\n\n";

/// Errors raised while converting to or from a transcript
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A segment that should be a `role: content` header has no colon
    #[error("Malformed transcript segment (missing role separator): {segment:?}")]
    Malformed { segment: String },

    /// A role the transcript format cannot express
    #[error("Unknown role in transcript conversion: {role}")]
    UnknownRole { role: String },
}

/// What to do with a message whose role has no transcript delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRolePolicy {
    /// Skip the message
    #[default]
    Drop,
    /// Fail the conversion
    Error,
}

/// Translates between [`Conversation`] and the delimited transcript format
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptConverter {
    on_unknown_role: UnknownRolePolicy,
}

impl PromptConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unknown-role policy
    pub fn with_unknown_role_policy(mut self, policy: UnknownRolePolicy) -> Self {
        self.on_unknown_role = policy;
        self
    }

    pub fn unknown_role_policy(&self) -> UnknownRolePolicy {
        self.on_unknown_role
    }

    /// Render a conversation as a transcript.
    ///
    /// Each turn is its role delimiter followed by the content; turns are
    /// separated by a blank line. Messages whose role is neither user nor
    /// assistant follow the unknown-role policy.
    pub fn to_transcript(&self, conversation: &[Message]) -> Result<String, TranscriptError> {
        let mut turns = Vec::with_capacity(conversation.len());

        for message in conversation {
            let delimiter = match message.role {
                MessageRole::User => HUMAN_PROMPT,
                MessageRole::Assistant => AI_PROMPT,
                other => {
                    self.unknown_role(other.as_str())?;
                    continue;
                }
            };
            turns.push(format!("{}{}", delimiter, message.content));
        }

        Ok(turns.join(TURN_SEPARATOR))
    }

    /// Parse a transcript back into a conversation.
    ///
    /// A header segment is split on its first colon. Inline content after the
    /// colon (`"Human: hi"`) is accepted; otherwise the next segment is the
    /// content. Headers without a colon are a parse error.
    ///
    /// Only transcripts produced by [`to_transcript`](Self::to_transcript)
    /// are guaranteed to parse back. An empty turn must keep its own blank
    /// segment: in `"Human:\n\nAssistant:\n\nhi"` the assistant header is
    /// read as the human turn's content and `"hi"` then fails as
    /// [`TranscriptError::Malformed`]. Content paragraphs are not checked for
    /// colons either, so a trailing `"note: more"` parses as a turn for the
    /// role `note` and follows the unknown-role policy.
    pub fn to_conversation(&self, transcript: &str) -> Result<Conversation, TranscriptError> {
        let mut conversation = Vec::new();

        if transcript.trim().is_empty() {
            return Ok(conversation);
        }

        // Some(None) is a header for a dropped role still waiting for its content
        let mut pending: Option<Option<MessageRole>> = None;

        for segment in transcript.split(TURN_SEPARATOR) {
            if let Some(role) = pending.take() {
                if let Some(role) = role {
                    conversation.push(Message::new(role, segment.trim()));
                }
                continue;
            }

            if segment.trim().is_empty() {
                continue;
            }

            let (name, inline) =
                segment
                    .split_once(':')
                    .ok_or_else(|| TranscriptError::Malformed {
                        segment: segment.to_string(),
                    })?;

            let role = self.resolve_role(name.trim())?;
            let inline = inline.trim();

            if inline.is_empty() {
                pending = Some(role);
            } else if let Some(role) = role {
                conversation.push(Message::new(role, inline));
            }
        }

        // Trailing header with nothing after it
        if let Some(Some(role)) = pending {
            conversation.push(Message::new(role, ""));
        }

        Ok(conversation)
    }

    fn resolve_role(&self, name: &str) -> Result<Option<MessageRole>, TranscriptError> {
        match name.to_ascii_lowercase().as_str() {
            "human" | "user" => Ok(Some(MessageRole::User)),
            "assistant" | "ai" => Ok(Some(MessageRole::Assistant)),
            _ => self.unknown_role(name).map(|_| None),
        }
    }

    fn unknown_role(&self, role: &str) -> Result<(), TranscriptError> {
        match self.on_unknown_role {
            UnknownRolePolicy::Drop => {
                debug!(role, "Dropping message with role unsupported by transcript format");
                Ok(())
            }
            UnknownRolePolicy::Error => Err(TranscriptError::UnknownRole {
                role: role.to_string(),
            }),
        }
    }
}
