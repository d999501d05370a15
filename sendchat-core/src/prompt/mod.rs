//! Prompt format conversion
//!
//! Batch providers take a role-tagged message list while streaming providers
//! take one transcript string with `Human:` / `Assistant:` delimiters. This
//! module translates between the two.

mod converter;

pub use converter::{
    PromptConverter, TranscriptError, UnknownRolePolicy, AI_PROMPT, HUMAN_PROMPT, TURN_SEPARATOR,
};
