//! Tests for transcript conversion

use proptest::prelude::*;
use sendchat_core::prompt::{PromptConverter, TranscriptError, UnknownRolePolicy, AI_PROMPT, HUMAN_PROMPT};
use sendchat_core::protocol::types::{Message, MessageRole};

#[test]
fn test_conversation_round_trip() {
    let converter = PromptConverter::new();
    let conversation = vec![
        Message::user("hi"),
        Message::assistant("hello"),
        Message::user("what is 2+2?"),
        Message::assistant("4"),
    ];

    let transcript = converter.to_transcript(&conversation).unwrap();
    assert!(transcript.starts_with(HUMAN_PROMPT));
    assert!(transcript.contains(AI_PROMPT));
    assert_eq!(converter.to_conversation(&transcript).unwrap(), conversation);
}

#[test]
fn test_parse_inline_headers() {
    let converter = PromptConverter::new();
    let conversation = converter
        .to_conversation("Human: hi there\n\nAssistant: hello")
        .unwrap();

    assert_eq!(
        conversation,
        vec![Message::user("hi there"), Message::assistant("hello")]
    );
}

#[test]
fn test_parse_role_names_case_insensitive() {
    let converter = PromptConverter::new();
    let conversation = converter.to_conversation("USER: a\n\nai: b").unwrap();

    assert_eq!(conversation[0].role, MessageRole::User);
    assert_eq!(conversation[1].role, MessageRole::Assistant);
}

#[test]
fn test_content_may_contain_colons() {
    let converter = PromptConverter::new();
    let conversation = vec![Message::user("time: 10:30")];

    let transcript = converter.to_transcript(&conversation).unwrap();
    assert_eq!(converter.to_conversation(&transcript).unwrap(), conversation);
}

#[test]
fn test_segment_without_colon_is_malformed() {
    let converter = PromptConverter::new();
    let err = converter.to_conversation("just some text").unwrap_err();

    assert_eq!(
        err,
        TranscriptError::Malformed {
            segment: "just some text".to_string()
        }
    );
}

#[test]
fn test_empty_transcript_yields_empty_conversation() {
    let converter = PromptConverter::new();
    assert!(converter.to_conversation("").unwrap().is_empty());
    assert_eq!(converter.to_transcript(&[]).unwrap(), "");
}

#[test]
fn test_unknown_role_in_transcript() {
    let dropping = PromptConverter::new();
    let conversation = dropping
        .to_conversation("System: be brief\n\nHuman: hi")
        .unwrap();
    assert_eq!(conversation, vec![Message::user("hi")]);

    let strict = PromptConverter::new().with_unknown_role_policy(UnknownRolePolicy::Error);
    let err = strict
        .to_conversation("System: be brief\n\nHuman: hi")
        .unwrap_err();
    assert!(matches!(err, TranscriptError::UnknownRole { role } if role == "System"));
}

fn turn() -> impl Strategy<Value = Message> {
    let content = "[a-zA-Z0-9][a-zA-Z0-9 ,.?!:]{0,30}[a-zA-Z0-9.?!]";
    (any::<bool>(), content).prop_map(|(human, content)| {
        if human {
            Message::user(content)
        } else {
            Message::assistant(content)
        }
    })
}

proptest! {
    #[test]
    fn prop_user_assistant_conversations_round_trip(conversation in prop::collection::vec(turn(), 0..8)) {
        let converter = PromptConverter::new();
        let transcript = converter.to_transcript(&conversation).unwrap();
        prop_assert_eq!(converter.to_conversation(&transcript).unwrap(), conversation);
    }
}
