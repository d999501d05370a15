//! Response cache for non-streaming calls
//!
//! A [`ResponseCache`] is an explicitly constructed handle passed to the
//! providers that use it. The default handle is disabled: every lookup misses
//! and every write is dropped. Store failures are logged and treated as misses
//! so a broken cache never fails a call.

pub mod fingerprint;
pub mod store;

pub use fingerprint::{ParseFingerprintError, RequestFingerprint};
pub use store::{CacheError, CacheStore, JsonFileStore, MemoryStore};

use crate::protocol::types::ChatResponse;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared handle to an optional cache store
#[derive(Clone, Default)]
pub struct ResponseCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl ResponseCache {
    /// Cache that never stores anything
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Unbounded in-process cache
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// In-process cache holding at most `max_entries` responses
    pub fn bounded(max_entries: usize) -> Self {
        Self::with_store(Arc::new(MemoryStore::bounded(max_entries)))
    }

    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn get(&self, fingerprint: &RequestFingerprint) -> Option<ChatResponse> {
        let store = self.store.as_ref()?;
        match store.get(fingerprint) {
            Ok(Some(response)) => {
                debug!(%fingerprint, "Response cache hit");
                Some(response)
            }
            Ok(None) => {
                debug!(%fingerprint, "Response cache miss");
                None
            }
            Err(e) => {
                warn!(%fingerprint, error = %e, "Response cache read failed");
                None
            }
        }
    }

    pub fn put(&self, fingerprint: RequestFingerprint, response: ChatResponse) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = store.put(fingerprint, response) {
            warn!(%fingerprint, error = %e, "Response cache write failed");
        }
    }

    /// Number of cached responses, zero when disabled
    pub fn len(&self) -> usize {
        self.store.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.is_enabled())
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disabled_cache_always_misses() {
        let cache = ResponseCache::default();
        let key = RequestFingerprint::of_value(&json!({"model": "gpt-4"}));

        cache.put(key, ChatResponse::from_content("ignored"));
        assert!(!cache.is_enabled());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_store() {
        let cache = ResponseCache::in_memory();
        let clone = cache.clone();
        let key = RequestFingerprint::of_value(&json!({"model": "gpt-4"}));

        clone.put(key, ChatResponse::from_content("shared"));
        assert_eq!(
            cache.get(&key).and_then(|r| r.first_content().map(String::from)),
            Some("shared".to_string())
        );
    }
}
