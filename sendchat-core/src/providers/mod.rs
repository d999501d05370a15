//! Provider clients and dispatch
//!
//! Two provider styles are supported. The batch provider sends role-tagged
//! messages and receives one response per call, with optional caching. The
//! streaming provider sends a transcript prompt and consumes the completion
//! as it arrives. The [`Dispatcher`] picks one based on which credentials
//! are present.

pub mod adapter;
pub mod batch;
pub mod dispatch;
pub mod error;
pub mod retry;
pub mod streaming;

pub use adapter::{
    BatchTransport, CompletionStream, ProviderClient, ProviderResponse, SendOutcome,
    StreamingTransport, TextStream,
};
pub use batch::BatchProvider;
pub use dispatch::{
    CredentialSource, Credentials, Dispatcher, EnvCredentials, ProviderFactory, ProviderKind,
    ANTHROPIC_API_KEY_ENV, OPENAI_API_KEY_ENV,
};
pub use error::{ProviderError, ProviderResult};
pub use retry::{RetryExecutor, RetryPolicy, RetryResult, RetryState, DEFAULT_MAX_ATTEMPTS};
pub use streaming::{
    collect_completion, is_claude_model, StreamingProvider, DEFAULT_MAX_TOKENS_TO_SAMPLE,
};
