//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be wired into the board.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{Post, PostId};
use crate::query::{Filter, SelectQuery};

/// REST-like remote persistence. One request per call, no retries.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// False when the endpoint or key is missing or a placeholder. Every
    /// operation then fails with `AppError::NotConfigured` without I/O.
    fn is_configured(&self) -> bool;

    async fn select(&self, collection: &str, query: &SelectQuery) -> Result<Value>;

    /// `records` may be a single object or an array; it is always sent as an array.
    async fn insert(&self, collection: &str, records: Value) -> Result<Value>;

    async fn update(&self, collection: &str, patch: Value, filter: &Filter) -> Result<Value>;

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Value>;
}

/// Durable key-value storage mirroring the post list.
///
/// Implementations never fail to the caller: write failures are logged, and
/// missing, corrupt or unreadable entries load as `None`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocalCache: Send + Sync {
    async fn save(&self, key: &str, value: &Value);
    async fn load(&self, key: &str) -> Option<Value>;
}

/// Rendering side of the board.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Presenter: Send + Sync {
    /// Redraw the whole timeline.
    fn render_list(&self, posts: &[Post]);

    /// Redraw one post's like affordance. Called once for the optimistic
    /// change and once more if it is rolled back.
    fn render_like_state(&self, post_id: &PostId, is_liked: bool, likes_count: u64);

    /// A load is in flight.
    fn render_loading(&self) {}
}
