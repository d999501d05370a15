//! Credential-driven provider selection
//!
//! The dispatcher holds an ordered list of candidates, each pairing a
//! credential lookup with a factory. On every call it reloads credentials and
//! builds the first candidate whose credential is present. The streaming
//! provider is listed first, so it wins whenever its credential is set, even
//! for models only the batch provider serves.

use crate::config::{SafeLogging, SecretString, SendchatConfig};
use crate::http::{build_client, AnthropicTransport, OpenAiTransport};
use crate::prompt::PromptConverter;
use crate::protocol::types::Message;
use crate::providers::adapter::{ProviderClient, SendOutcome};
use crate::providers::batch::BatchProvider;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::streaming::StreamingProvider;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable holding the streaming provider's key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable holding the batch provider's key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Provider credentials; empty values count as absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub anthropic: Option<SecretString>,
    pub openai: Option<SecretString>,
}

impl Credentials {
    pub fn new(anthropic: Option<&str>, openai: Option<&str>) -> Self {
        Self {
            anthropic: non_empty(anthropic.map(str::to_string)),
            openai: non_empty(openai.map(str::to_string)),
        }
    }

    /// Read both keys from the process environment
    pub fn from_env() -> Self {
        Self {
            anthropic: non_empty(std::env::var(ANTHROPIC_API_KEY_ENV).ok()),
            openai: non_empty(std::env::var(OPENAI_API_KEY_ENV).ok()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<SecretString> {
    value.filter(|v| !v.trim().is_empty()).map(SecretString::new)
}

/// Where the dispatcher gets credentials from on each call
pub trait CredentialSource: Send + Sync {
    fn load(&self) -> Credentials;
}

/// Reads credentials from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn load(&self) -> Credentials {
        Credentials::from_env()
    }
}

impl CredentialSource for Credentials {
    fn load(&self) -> Credentials {
        self.clone()
    }
}

/// Which provider style a candidate builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Streaming,
    Batch,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => f.write_str(StreamingProvider::NAME),
            Self::Batch => f.write_str(BatchProvider::NAME),
        }
    }
}

/// Builds a provider from its credential
pub type ProviderFactory =
    Arc<dyn Fn(&SecretString) -> ProviderResult<Arc<dyn ProviderClient>> + Send + Sync>;

fn anthropic_key(credentials: &Credentials) -> Option<&SecretString> {
    credentials.anthropic.as_ref()
}

fn openai_key(credentials: &Credentials) -> Option<&SecretString> {
    credentials.openai.as_ref()
}

struct Candidate {
    kind: ProviderKind,
    credential: fn(&Credentials) -> Option<&SecretString>,
    factory: ProviderFactory,
}

/// Single call surface over the streaming and batch providers
pub struct Dispatcher {
    credentials: Arc<dyn CredentialSource>,
    candidates: Vec<Candidate>,
}

impl Dispatcher {
    /// Dispatcher with the given factories, reading credentials from the environment
    pub fn new(streaming: ProviderFactory, batch: ProviderFactory) -> Self {
        Self {
            credentials: Arc::new(EnvCredentials),
            candidates: vec![
                Candidate {
                    kind: ProviderKind::Streaming,
                    credential: anthropic_key,
                    factory: streaming,
                },
                Candidate {
                    kind: ProviderKind::Batch,
                    credential: openai_key,
                    factory: batch,
                },
            ],
        }
    }

    /// Dispatcher backed by the HTTP transports described by `config`
    ///
    /// Each provider style gets one HTTP client, shared by every provider the
    /// dispatcher builds, so pooled connections survive across calls.
    pub fn from_config(config: &SendchatConfig) -> ProviderResult<Self> {
        let cache = config
            .cache
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        let streaming_client =
            build_client(Duration::from_secs(config.streaming.timeout_secs))?;
        let batch_client = build_client(Duration::from_secs(config.batch.timeout_secs))?;

        let streaming_config = config.streaming.clone();
        let streaming_retry = config.retry.clone();
        let streaming: ProviderFactory = Arc::new(
            move |key: &SecretString| -> ProviderResult<Arc<dyn ProviderClient>> {
                let transport = AnthropicTransport::new(
                    streaming_client.clone(),
                    streaming_config.base_url.clone(),
                    key.clone(),
                );
                let converter = PromptConverter::new()
                    .with_unknown_role_policy(streaming_config.unknown_role);
                let provider = StreamingProvider::new(Arc::new(transport))
                    .with_retry_policy(streaming_retry.clone())
                    .with_max_tokens_to_sample(streaming_config.max_tokens_to_sample)
                    .with_extra_headers(streaming_config.extra_headers.clone())
                    .with_converter(converter);
                Ok(Arc::new(provider))
            },
        );

        let batch_config = config.batch.clone();
        let batch_retry = config.retry.clone();
        let batch: ProviderFactory = Arc::new(
            move |key: &SecretString| -> ProviderResult<Arc<dyn ProviderClient>> {
                let transport = OpenAiTransport::new(
                    batch_client.clone(),
                    batch_config.base_url.clone(),
                    key.clone(),
                );
                let provider = BatchProvider::new(Arc::new(transport))
                    .with_cache(cache.clone())
                    .with_retry_policy(batch_retry.clone())
                    .with_temperature(batch_config.temperature)
                    .with_deployment_id(batch_config.deployment_id.clone())
                    .with_engine(batch_config.engine.clone());
                Ok(Arc::new(provider))
            },
        );

        Ok(Self::new(streaming, batch))
    }

    /// Dispatcher with default settings
    pub fn from_env() -> ProviderResult<Self> {
        Self::from_config(&SendchatConfig::default())
    }

    pub fn with_credentials(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credentials = source;
        self
    }

    /// Which provider `credentials` would select, without building it
    pub fn selected_kind(&self, credentials: &Credentials) -> Option<ProviderKind> {
        self.candidates
            .iter()
            .find(|c| (c.credential)(credentials).is_some())
            .map(|c| c.kind)
    }

    /// Build the provider `credentials` select
    pub fn select(
        &self,
        credentials: &Credentials,
    ) -> ProviderResult<(ProviderKind, Arc<dyn ProviderClient>)> {
        debug!(
            anthropic = %credentials.anthropic.safe_for_logging(),
            openai = %credentials.openai.safe_for_logging(),
            "Selecting provider"
        );

        for candidate in &self.candidates {
            if let Some(key) = (candidate.credential)(credentials) {
                let provider = (candidate.factory)(key)?;
                return Ok((candidate.kind, provider));
            }
        }

        Err(ProviderError::Configuration(format!(
            "No provider credentials found; set {} or {}",
            ANTHROPIC_API_KEY_ENV, OPENAI_API_KEY_ENV
        )))
    }

    fn current_provider(&self, model: &str) -> ProviderResult<Arc<dyn ProviderClient>> {
        let (kind, provider) = self.select(&self.credentials.load())?;
        info!(provider = %kind, model, "Dispatching request");
        Ok(provider)
    }

    pub async fn send_with_retries(
        &self,
        model: &str,
        conversation: &[Message],
        tools: Option<&[Value]>,
        stream: bool,
    ) -> ProviderResult<SendOutcome> {
        self.current_provider(model)?
            .send_with_retries(model, conversation, tools, stream)
            .await
    }

    pub async fn simple_send(
        &self,
        model: &str,
        conversation: &[Message],
    ) -> ProviderResult<Option<String>> {
        self.current_provider(model)?
            .simple_send(model, conversation)
            .await
    }
}
