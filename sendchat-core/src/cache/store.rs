//! Key-value stores backing the response cache

use super::fingerprint::RequestFingerprint;
use crate::protocol::types::ChatResponse;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised by a cache store
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Persistence boundary for cached responses
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &RequestFingerprint) -> Result<Option<ChatResponse>, CacheError>;

    fn put(&self, key: RequestFingerprint, response: ChatResponse) -> Result<(), CacheError>;

    /// Number of stored entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<RequestFingerprint, ChatResponse>,
    // insertion order, used for eviction when bounded
    order: VecDeque<RequestFingerprint>,
}

/// In-process store, unbounded unless a maximum entry count is given
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    max_entries: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that evicts its oldest entry once `max_entries` is exceeded
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            max_entries: Some(max_entries),
        }
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &RequestFingerprint) -> Result<Option<ChatResponse>, CacheError> {
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    fn put(&self, key: RequestFingerprint, response: ChatResponse) -> Result<(), CacheError> {
        let mut inner = self.inner.lock();
        if inner.entries.insert(key, response).is_none() {
            inner.order.push_back(key);
        }

        if let Some(max) = self.max_entries {
            while inner.entries.len() > max {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                        debug!(fingerprint = %oldest, "Evicted cached response");
                    }
                    None => break,
                }
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

/// Store persisted as one JSON object keyed by fingerprint hex
///
/// The whole file is rewritten on every `put`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, ChatResponse>>,
}

impl JsonFileStore {
    /// Open the store, loading existing entries if the file exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| CacheError::Io {
                path: path.display().to_string(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened response cache file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, ChatResponse>) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let data = serde_json::to_string(entries)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl CacheStore for JsonFileStore {
    fn get(&self, key: &RequestFingerprint) -> Result<Option<ChatResponse>, CacheError> {
        Ok(self.entries.lock().get(&key.to_hex()).cloned())
    }

    fn put(&self, key: RequestFingerprint, response: ChatResponse) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_hex(), response);
        self.flush(&entries)
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
