//! # kh-cache-local
//! khawater/crates/kh-plugins/kh-cache-local/src/lib.rs
//! Local implementations of `LocalCache`.
//! Features: one JSON document per key, atomic replace, a browser-like quota.

mod memory;

pub use memory::MemoryCache;

use async_trait::async_trait;
use kh_core::error::{AppError, Result};
use kh_core::traits::LocalCache;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default per-entry quota, the usual browser storage allowance.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub struct FileCache {
    /// Directory holding one `<key>.json` file per entry (e.g., "./data/cache")
    root_path: PathBuf,
    /// Entries larger than this are refused; `None` disables the check
    quota_bytes: Option<usize>,
}

impl FileCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root_path: root,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Keys are free text; file names keep only `[A-Za-z0-9_-]`.
    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root_path.join(format!("{name}.json"))
    }

    async fn try_save(&self, key: &str, value: &Value) -> Result<()> {
        let data = serde_json::to_vec(value).map_err(|e| AppError::Storage(e.to_string()))?;
        if let Some(quota) = self.quota_bytes {
            if data.len() > quota {
                return Err(AppError::Storage(format!(
                    "quota exceeded: {} bytes > {quota}",
                    data.len()
                )));
            }
        }

        fs::create_dir_all(&self.root_path).await.map_err(storage)?;

        // Write beside the target, then rename over it, so readers never see
        // a half-written document. Each write gets its own temp file.
        let target = self.entry_path(key);
        let tmp = target.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        let written = match fs::write(&tmp, &data).await {
            Ok(()) => fs::rename(&tmp, &target).await,
            Err(e) => Err(e),
        };
        if written.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        written.map_err(storage)
    }

    async fn try_load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("corrupt entry {}: {e}", path.display())))
    }
}

fn storage(err: std::io::Error) -> AppError {
    AppError::Storage(err.to_string())
}

#[async_trait]
impl LocalCache for FileCache {
    async fn save(&self, key: &str, value: &Value) {
        if let Err(err) = self.try_save(key, value).await {
            warn!(key, error = %err, "could not save to local cache");
        }
    }

    async fn load(&self, key: &str) -> Option<Value> {
        match self.try_load(key).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                debug!(key, "local cache miss");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "could not read local cache");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache"));

        cache.save("khawater_posts", &json!([{ "id": "a" }])).await;
        assert_eq!(
            cache.load("khawater_posts").await,
            Some(json!([{ "id": "a" }]))
        );
        assert!(dir.path().join("cache/khawater_posts.json").exists());
    }

    #[tokio::test]
    async fn overlapping_saves_leave_a_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(FileCache::new(dir.path().to_path_buf()));

        let writers: Vec<_> = (0..32)
            .map(|n| {
                let cache = cache.clone();
                let value = json!([{ "id": n, "content": "ش".repeat(2048) }]);
                tokio::spawn(async move { cache.save("posts", &value).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let stored = cache.load("posts").await.expect("a complete entry");
        assert_eq!(stored[0]["content"].as_str().unwrap().chars().count(), 2048);
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                let name = entry.as_ref().unwrap().file_name();
                name.to_string_lossy().ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn missing_key_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf());
        assert_eq!(cache.load("nothing").await, None);
    }

    #[tokio::test]
    async fn corrupt_entry_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("posts.json"), b"{ not json").unwrap();
        assert_eq!(cache.load("posts").await, None);
    }

    #[tokio::test]
    async fn quota_overrun_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf()).with_quota(Some(32));

        cache.save("posts", &json!(["small"])).await;
        cache.save("posts", &json!(["x".repeat(64)])).await;
        assert_eq!(cache.load("posts").await, Some(json!(["small"])));
    }

    #[tokio::test]
    async fn unwritable_root_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let cache = FileCache::new(blocker.join("cache"));

        cache.save("posts", &json!([])).await;
        assert_eq!(cache.load("posts").await, None);
    }

    #[test]
    fn keys_are_made_file_safe() {
        let cache = FileCache::new(PathBuf::from("/tmp/c"));
        assert_eq!(
            cache.entry_path("../evil key"),
            PathBuf::from("/tmp/c/___evil_key.json")
        );
    }
}
