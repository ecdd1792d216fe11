//! Process-local `LocalCache` for tests and for deployments without a
//! writable disk. Values are stored serialized so that reads behave like the
//! file-backed cache.

use async_trait::async_trait;
use dashmap::DashMap;
use kh_core::traits::LocalCache;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw text under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        self.entries.insert(key.to_string(), raw.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn save(&self, key: &str, value: &Value) {
        match serde_json::to_string(value) {
            Ok(text) => {
                self.entries.insert(key.to_string(), text);
            }
            Err(err) => warn!(key, error = %err, "could not serialize cache entry"),
        }
    }

    async fn load(&self, key: &str) -> Option<Value> {
        let text = self.entries.get(key)?.value().clone();
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "corrupt in-memory cache entry");
                None
            }
        }
    }
}
