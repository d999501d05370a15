//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::cache::{CacheError, JsonFileStore, ResponseCache};
use crate::http::{DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_OPENAI_BASE_URL};
use crate::prompt::UnknownRolePolicy;
use crate::providers::retry::RetryPolicy;
use crate::providers::streaming::DEFAULT_MAX_TOKENS_TO_SAMPLE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Supported configuration schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Well-known location of the persistent response cache
pub const DEFAULT_CACHE_PATH: &str = "~/.sendchat.send.cache.v1";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SendchatConfig {
    /// Schema version (required)
    pub version: String,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl Default for SendchatConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
            batch: BatchConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

/// Where cached responses live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map, lost on exit
    #[default]
    Memory,
    /// JSON file at `path`
    File,
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub backend: CacheBackend,
    pub path: String,
    /// Bound on the in-memory backend; unbounded when absent
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: CacheBackend::Memory,
            path: DEFAULT_CACHE_PATH.to_string(),
            max_entries: None,
        }
    }
}

impl CacheConfig {
    /// Construct the cache these settings describe
    pub fn build(&self) -> Result<ResponseCache, CacheError> {
        if !self.enabled {
            return Ok(ResponseCache::disabled());
        }
        match (self.backend, self.max_entries) {
            (CacheBackend::File, _) => {
                let store = JsonFileStore::open(expand_home(&self.path))?;
                Ok(ResponseCache::with_store(Arc::new(store)))
            }
            (CacheBackend::Memory, Some(max)) => Ok(ResponseCache::bounded(max)),
            (CacheBackend::Memory, None) => Ok(ResponseCache::in_memory()),
        }
    }
}

/// Batch (chat completion) provider settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub base_url: String,
    pub temperature: f32,
    pub deployment_id: Option<String>,
    pub engine: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            temperature: 0.0,
            deployment_id: None,
            engine: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Streaming (transcript completion) provider settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamingConfig {
    pub base_url: String,
    pub max_tokens_to_sample: u32,
    pub extra_headers: HashMap<String, String>,
    pub unknown_role: UnknownRolePolicy,
    pub timeout_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            max_tokens_to_sample: DEFAULT_MAX_TOKENS_TO_SAMPLE,
            extra_headers: HashMap::new(),
            unknown_role: UnknownRolePolicy::Drop,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    600
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

impl SendchatConfig {
    /// Basic structural validation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::UnsupportedVersion {
                    found: self.version.clone(),
                },
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ValidationError::out_of_range(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if !self.retry.exponential_base.is_finite() || self.retry.exponential_base < 1.0 {
            return Err(ValidationError::out_of_range(
                "retry.exponential_base",
                format!("must be >= 1.0, got {}", self.retry.exponential_base),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(ValidationError::out_of_range(
                "retry.jitter_factor",
                format!("must be within [0, 1], got {}", self.retry.jitter_factor),
            ));
        }

        if self.cache.max_entries == Some(0) {
            return Err(ValidationError::out_of_range(
                "cache.max_entries",
                "must be at least 1 when set",
            ));
        }

        if self.streaming.max_tokens_to_sample == 0 {
            return Err(ValidationError::out_of_range(
                "streaming.max_tokens_to_sample",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}
