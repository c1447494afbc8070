//! Best-effort cache of persona rewrites over an injected [`KeyValueStore`].
//!
//! Entries are stored as JSON `{"value": ..., "ts": <epoch ms>}` under
//! `"{prefix}:{key}"`. Nothing here ever surfaces an error: unreadable
//! storage, corrupt entries and failed writes all degrade to "not cached".

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Namespace used when none is configured.
pub const DEFAULT_PREFIX: &str = "p13n";

/// Serialized form of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Rewritten Markdown.
    pub value: String,
    /// Creation time in milliseconds since the Unix epoch. Advisory only.
    pub ts: i64,
}

/// Namespaced string cache.
#[derive(Clone)]
pub struct PersonalizationCache {
    prefix: String,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for PersonalizationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalizationCache")
            .field("prefix", &self.prefix)
            .field("attached", &self.store.is_some())
            .finish()
    }
}

impl PersonalizationCache {
    /// Cache over `store` using the default prefix.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(store, DEFAULT_PREFIX)
    }

    /// Cache over `store` namespaced by `prefix`.
    pub fn with_prefix(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            store: Some(store),
        }
    }

    /// Cache with no storage behind it: every lookup misses, every write is dropped.
    pub fn detached() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            store: None,
        }
    }

    /// Namespaced storage key for `key`.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    async fn read_raw(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.read(&self.storage_key(key)).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "cache read failed");
                None
            }
        }
    }

    /// Cached value for `key`, or `None` when missing, corrupt or unavailable.
    pub async fn get(&self, key: &str) -> Option<String> {
        let raw = self.read_raw(key).await?;
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str::<StoredEntry>(&raw) {
            Ok(entry) => Some(entry.value),
            Err(err) => {
                debug!(key, error = %err, "ignoring corrupt cache entry");
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any earlier entry.
    pub async fn set(&self, key: &str, value: &str) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let entry = StoredEntry {
            value: value.to_owned(),
            ts: Utc::now().timestamp_millis(),
        };
        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "cache entry serialization failed");
                return;
            }
        };
        if let Err(err) = store.write(&self.storage_key(key), &payload).await {
            warn!(key, error = %err, "cache write failed");
        }
    }

    /// Whether anything is stored under `key`.
    pub async fn has(&self, key: &str) -> bool {
        self.read_raw(key).await.is_some()
    }

    /// Drop the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(err) = store.remove(&self.storage_key(key)).await {
            warn!(key, error = %err, "cache invalidate failed");
        }
    }
}
