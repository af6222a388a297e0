//! Persisted state — per-key JSON blobs in a JSONL file.
//!
//! Used for session/workspace metadata that should survive a server
//! restart. Semantics are deliberately small: upsert, last-write-wins, no
//! transactions across keys. Entries are loaded into memory on open and
//! flushed to disk on every mutation — fast reads, durable writes, and the
//! file stays human-inspectable.

use codesmith_core::error::StoreError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(serde::Serialize, serde::Deserialize)]
struct Line {
    key: String,
    value: Value,
}

/// A file-backed key/value blob store (one JSON object per line).
pub struct StateStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl StateStore {
    /// Open a store at the given path, loading any existing entries.
    ///
    /// A missing file means an empty store; it is created on first write.
    pub fn open(path: PathBuf) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "State store opened");
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn load_from_disk(path: &PathBuf) -> BTreeMap<String, Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };

        let mut entries = BTreeMap::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<Line>(line) {
                // Later lines win, so a partially compacted file still
                // resolves to the last write
                Ok(entry) => {
                    entries.insert(entry.key, entry.value);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted state entry");
                }
            }
        }
        entries
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let entries = self.entries.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("failed to create state directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for (key, value) in entries.iter() {
            let line = serde_json::to_string(&Line {
                key: key.clone(),
                value: value.clone(),
            })
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Storage(format!("failed to write state file: {e}")))
    }

    /// Upsert a value under a key.
    pub async fn put(&self, key: impl Into<String>, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.into(), value);
        self.flush().await
    }

    /// Fetch a value by key.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Remove a key. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let existed = self.entries.write().await.remove(key).is_some();
        if existed {
            self.flush().await?;
        }
        Ok(existed)
    }

    /// All keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}
