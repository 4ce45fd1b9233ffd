//! Key-value store seam used by the adapter, plus an in-memory implementation

use crate::{CoreError, Result, KEY_NOT_FOUND};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Store endpoint that always answers on a healthy store
pub const VERSION_PATH: &str = "version";

/// Operations the adapter needs from a hierarchical key-value store
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Raw read of a store endpoint (not the key space), used for liveness
    async fn read(&self, path: &str) -> Result<String>;

    /// Unconditional upsert; `ttl == 0` means the key never expires
    async fn write(&self, key: &str, value: &str, ttl: u64) -> Result<()>;

    /// Delete a key, and everything beneath it when `recursive`
    async fn delete(&self, key: &str, recursive: bool) -> Result<()>;
}

/// A value held by [`MemoryStore`]
#[derive(Clone, Debug, PartialEq)]
pub struct StoredValue {
    pub value: String,
    pub ttl: u64,
}

/// Every call made against a [`MemoryStore`], in order
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    Read(String),
    Write { key: String, value: String, ttl: u64 },
    Delete { key: String, recursive: bool },
}

/// In-memory store that records calls and can inject failures.
///
/// TTLs are recorded but never enforced.
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
    failing_keys: Arc<RwLock<HashSet<String>>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            failing_keys: Arc::new(RwLock::new(HashSet::new())),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the store going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every write or delete against `key` get rejected
    pub async fn fail_key(&self, key: impl Into<String>) {
        self.failing_keys.write().await.insert(key.into());
    }

    pub async fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn check(&self, key: &str) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CoreError::StoreUnavailable("memory store offline".to_string()));
        }
        if self.failing_keys.read().await.contains(key) {
            return Err(CoreError::StoreOperationFailed {
                key: key.to_string(),
                code: None,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<String> {
        self.calls.write().await.push(StoreCall::Read(path.to_string()));
        self.check(path).await?;

        if path == VERSION_PATH {
            return Ok(r#"{"etcdserver":"memory"}"#.to_string());
        }

        self.get(path)
            .await
            .map(|stored| stored.value)
            .ok_or_else(|| not_found(path))
    }

    async fn write(&self, key: &str, value: &str, ttl: u64) -> Result<()> {
        self.calls.write().await.push(StoreCall::Write {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        });
        self.check(key).await?;

        self.entries.write().await.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                ttl,
            },
        );
        debug!("memory store: set {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        self.calls.write().await.push(StoreCall::Delete {
            key: key.to_string(),
            recursive,
        });
        self.check(key).await?;

        let mut entries = self.entries.write().await;
        let removed = entries.remove(key).is_some();

        let mut removed_children = false;
        if recursive {
            let dir = format!("{}/", key);
            let before = entries.len();
            entries.retain(|k, _| !k.starts_with(&dir));
            removed_children = entries.len() != before;
        }

        if removed || removed_children {
            debug!("memory store: deleted {}", key);
            Ok(())
        } else {
            Err(not_found(key))
        }
    }
}

fn not_found(key: &str) -> CoreError {
    CoreError::StoreOperationFailed {
        key: key.to_string(),
        code: Some(KEY_NOT_FOUND),
        message: "Key not found".to_string(),
    }
}
