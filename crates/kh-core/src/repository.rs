//! # Post Repository
//!
//! Owns the in-memory timeline and keeps it in step with the remote store
//! and the local cache.
//!
//! Fallback order on load: remote store, then local cache, then seed posts.
//! Remote and storage failures never escape this module; they turn into one
//! of those fallbacks, a local-only creation, or a like rollback.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::content::{extract_hashtags, sanitize_text};
use crate::error::Result;
use crate::models::{LikeState, Mood, Post, PostId, UserProfile};
use crate::query::{Filter, SelectQuery};
use crate::seed::seed_posts;
use crate::traits::{LocalCache, Presenter, RemoteStore};

/// Where and how much the repository reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Remote collection holding the posts
    pub collection: String,
    /// Local cache key holding the serialized timeline
    pub storage_key: String,
    /// Number of posts fetched by `load`
    pub page_size: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            collection: "posts".to_string(),
            storage_key: "khawater_posts".to_string(),
            page_size: 20,
        }
    }
}

pub struct PostRepository {
    shared: Arc<Shared>,
    profile: UserProfile,
    loading: AtomicBool,
}

/// State that outlives a single call: like confirmations run on their own
/// task so an abandoned request still settles.
struct Shared {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    options: RepositoryOptions,
    /// Newest first. Never held across a remote or cache call.
    posts: RwLock<Vec<Post>>,
    observers: Mutex<Vec<Arc<dyn Presenter>>>,
}

/// Lowers the loading flag however `load` ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PostRepository {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        options: RepositoryOptions,
        profile: UserProfile,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                remote,
                cache,
                options,
                posts: RwLock::new(Vec::new()),
                observers: Mutex::new(Vec::new()),
            }),
            profile,
            loading: AtomicBool::new(false),
        }
    }

    /// Registers a presenter to be told about like changes.
    pub fn subscribe(&self, observer: Arc<dyn Presenter>) {
        self.shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Snapshot of the current timeline.
    pub async fn posts(&self) -> Vec<Post> {
        self.shared.posts.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Creates a whisper. Always succeeds locally; the remote insert is best
    /// effort and only contributes a server-assigned id.
    #[instrument(skip(self, content), fields(collection = %self.shared.options.collection))]
    pub async fn create(&self, content: &str, mood: Mood, is_anonymous: bool) -> Post {
        let shared = &self.shared;
        let mut post = Post {
            id: PostId::generate(),
            content: sanitize_text(content),
            mood,
            is_anonymous,
            author: self.profile.author_for(is_anonymous),
            hashtags: extract_hashtags(content),
            likes_count: 0,
            is_liked: false,
            created_at: Utc::now(),
        };

        if shared.remote.is_configured() {
            match shared
                .remote
                .insert(&shared.options.collection, post.to_row())
                .await
            {
                Ok(returned) => {
                    if let Some(id) = server_assigned_id(&returned) {
                        debug!(local_id = %post.id, remote_id = %id, "adopting server id");
                        post.id = id;
                    }
                }
                Err(err) => warn!(error = %err, "remote insert failed; keeping whisper locally"),
            }
        }

        let snapshot = {
            let mut posts = shared.posts.write().await;
            posts.retain(|p| p.id != post.id);
            posts.insert(0, post.clone());
            posts.clone()
        };
        shared.persist(&snapshot).await;

        info!(post_id = %post.id, "whisper created");
        post
    }

    /// Loads the timeline. Total: always yields a list.
    #[instrument(skip(self), fields(collection = %self.shared.options.collection))]
    pub async fn load(&self) -> Vec<Post> {
        let _loading = LoadingGuard::raise(&self.loading);
        self.load_from_sources().await
    }

    async fn load_from_sources(&self) -> Vec<Post> {
        let shared = &self.shared;
        if shared.remote.is_configured() {
            match self.fetch_remote().await {
                Ok(posts) if !posts.is_empty() => {
                    info!(count = posts.len(), "timeline loaded from remote store");
                    self.replace(posts.clone()).await;
                    shared.persist(&posts).await;
                    return posts;
                }
                Ok(_) => debug!("remote store has no whispers"),
                Err(err) => warn!(error = %err, "remote load failed; falling back to cache"),
            }
        } else {
            debug!("remote store not configured");
        }

        if let Some(cached) = self.load_cached().await {
            let total = cached.len();
            let posts = dedup_by_id(cached);
            info!(count = posts.len(), "timeline loaded from local cache");
            self.replace(posts.clone()).await;
            if posts.len() != total {
                shared.persist(&posts).await;
            }
            return posts;
        }

        let seeds = seed_posts();
        info!(count = seeds.len(), "no whispers anywhere; showing seed posts");
        self.replace(seeds.clone()).await;
        shared.persist(&seeds).await;
        seeds
    }

    async fn fetch_remote(&self) -> Result<Vec<Post>> {
        let options = &self.shared.options;
        let query = SelectQuery::newest_first("created_at", options.page_size);
        let value = self.shared.remote.select(&options.collection, &query).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let rows: Vec<Value> = serde_json::from_value(value)?;
        let posts = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Post>(row) {
                // No per-user like records exist remotely.
                Ok(post) => Some(Post {
                    is_liked: false,
                    ..post
                }),
                Err(err) => {
                    warn!(error = %err, "skipping malformed remote row");
                    None
                }
            })
            .collect();
        Ok(dedup_by_id(posts))
    }

    /// Cached timeline, or `None` when absent, empty or unreadable.
    async fn load_cached(&self) -> Option<Vec<Post>> {
        let key = &self.shared.options.storage_key;
        let value = self.shared.cache.load(key).await?;
        match serde_json::from_value::<Vec<Post>>(value) {
            Ok(posts) if !posts.is_empty() => Some(posts),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, %key, "cached timeline is corrupt");
                None
            }
        }
    }

    /// Flips the like on `post_id` optimistically, then confirms remotely.
    ///
    /// Presenters see the optimistic state before the remote call and the
    /// restored state if the call fails. Confirmation runs on a spawned task,
    /// so it completes even when the caller stops waiting. Returns the final
    /// state, or `None` for an unknown post.
    #[instrument(skip(self))]
    pub async fn toggle_like(&self, post_id: &PostId) -> Option<LikeState> {
        let (previous, optimistic) = {
            let mut posts = self.shared.posts.write().await;
            let post = posts.iter_mut().find(|p| &p.id == post_id)?;
            let previous = post.like_state();
            post.is_liked = !post.is_liked;
            post.likes_count = if post.is_liked {
                post.likes_count + 1
            } else {
                post.likes_count.saturating_sub(1)
            };
            (previous, post.like_state())
        };

        let settle = tokio::spawn(
            Arc::clone(&self.shared).settle_like(previous, optimistic.clone()),
        );
        match settle.await {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(error = %err, "like confirmation task failed");
                Some(optimistic)
            }
        }
    }

    async fn replace(&self, posts: Vec<Post>) {
        *self.shared.posts.write().await = posts;
    }
}

impl Shared {
    /// Persists and signals the optimistic like, then confirms it remotely,
    /// restoring `previous` if the remote store refuses.
    async fn settle_like(self: Arc<Self>, previous: LikeState, optimistic: LikeState) -> LikeState {
        let snapshot = self.posts.read().await.clone();
        self.persist(&snapshot).await;
        self.notify(&optimistic);

        if !self.remote.is_configured() {
            return optimistic;
        }

        let patch = serde_json::json!({ "likes_count": optimistic.likes_count });
        let filter = Filter::eq("id", &optimistic.post_id);
        match self
            .remote
            .update(&self.options.collection, patch, &filter)
            .await
        {
            Ok(_) => optimistic,
            Err(err) => {
                warn!(error = %err, post_id = %previous.post_id, "remote like update failed; rolling back");
                let snapshot = {
                    let mut posts = self.posts.write().await;
                    if let Some(post) = posts.iter_mut().find(|p| p.id == previous.post_id) {
                        post.is_liked = previous.is_liked;
                        post.likes_count = previous.likes_count;
                    }
                    posts.clone()
                };
                self.persist(&snapshot).await;
                self.notify(&previous);
                previous
            }
        }
    }

    async fn persist(&self, posts: &[Post]) {
        match serde_json::to_value(posts) {
            Ok(value) => self.cache.save(&self.options.storage_key, &value).await,
            Err(err) => warn!(error = %err, "could not serialize timeline for the cache"),
        }
    }

    fn notify(&self, state: &LikeState) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.render_like_state(&state.post_id, state.is_liked, state.likes_count);
        }
    }
}

/// The id of the first record returned by an insert, if any.
fn server_assigned_id(returned: &Value) -> Option<PostId> {
    let record = match returned {
        Value::Array(records) => records.first()?,
        Value::Object(_) => returned,
        _ => return None,
    };
    record.get("id").and_then(PostId::from_value)
}

/// Keeps the first post of every id, preserving order.
fn dedup_by_id(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::ANONYMOUS_AUTHOR;
    use crate::test_support::{MapCache, RecordingPresenter};
    use crate::traits::MockRemoteStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Remote whose reads and like updates take a while; updates then fail.
    struct SlowRemote {
        select_delay: Duration,
        update_delay: Duration,
    }

    #[async_trait]
    impl RemoteStore for SlowRemote {
        fn is_configured(&self) -> bool {
            true
        }

        async fn select(&self, _: &str, _: &SelectQuery) -> Result<Value> {
            tokio::time::sleep(self.select_delay).await;
            Ok(Value::Null)
        }

        async fn insert(&self, _: &str, _: Value) -> Result<Value> {
            Err(AppError::transport("read-only"))
        }

        async fn update(&self, _: &str, _: Value, _: &Filter) -> Result<Value> {
            tokio::time::sleep(self.update_delay).await;
            Err(AppError::remote(503, "unavailable"))
        }

        async fn delete(&self, _: &str, _: &Filter) -> Result<Value> {
            Err(AppError::transport("read-only"))
        }
    }

    fn offline_remote() -> MockRemoteStore {
        let mut remote = MockRemoteStore::new();
        remote.expect_is_configured().return_const(false);
        remote
    }

    fn online_remote() -> MockRemoteStore {
        let mut remote = MockRemoteStore::new();
        remote.expect_is_configured().return_const(true);
        remote
    }

    fn repo(remote: MockRemoteStore, cache: Arc<MapCache>) -> PostRepository {
        PostRepository::new(
            Arc::new(remote),
            cache,
            RepositoryOptions::default(),
            UserProfile::default(),
        )
    }

    fn cached_posts(cache: &MapCache) -> Vec<Post> {
        serde_json::from_value(cache.get("khawater_posts").expect("cache entry")).unwrap()
    }

    #[tokio::test]
    async fn create_offline_keeps_post_locally() {
        let cache = Arc::new(MapCache::default());
        let repo = repo(offline_remote(), cache.clone());

        let post = repo.create("مرحبا #سلام", Mood::Emerald, true).await;

        assert_eq!(post.hashtags, vec!["#سلام"]);
        assert_eq!(post.author, ANONYMOUS_AUTHOR);
        assert_eq!(post.likes_count, 0);
        assert_eq!(repo.posts().await, vec![post.clone()]);
        assert_eq!(cached_posts(&cache), vec![post]);
    }

    #[tokio::test]
    async fn create_adopts_server_id() {
        let mut remote = online_remote();
        remote
            .expect_insert()
            .withf(|collection, row| collection == "posts" && row.get("isLiked").is_none())
            .times(1)
            .returning(|_, _| Ok(json!([{ "id": 99 }])));
        let repo = repo(remote, Arc::new(MapCache::default()));

        let post = repo.create("hi", Mood::Ocean, false).await;
        assert_eq!(post.id, PostId::new("99"));
    }

    #[tokio::test]
    async fn create_survives_remote_failure() {
        let mut remote = online_remote();
        remote
            .expect_insert()
            .returning(|_, _| Err(AppError::remote(500, "boom")));
        let cache = Arc::new(MapCache::default());
        let repo = repo(remote, cache.clone());

        let post = repo.create("  <i>x</i>  ", Mood::Amber, false).await;
        assert_eq!(post.content, "&lt;i&gt;x&lt;/i&gt;");
        assert_eq!(repo.posts().await.len(), 1);
        assert_eq!(cached_posts(&cache).len(), 1);
    }

    #[tokio::test]
    async fn create_prepends_newest_first() {
        let repo = repo(offline_remote(), Arc::new(MapCache::default()));
        let first = repo.create("one", Mood::Emerald, true).await;
        let second = repo.create("two", Mood::Emerald, true).await;

        let ids: Vec<PostId> = repo.posts().await.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn load_unconfigured_empty_cache_seeds() {
        let cache = Arc::new(MapCache::default());
        let repo = repo(offline_remote(), cache.clone());

        let posts = repo.load().await;
        let likes: Vec<u64> = posts.iter().map(|p| p.likes_count).collect();
        assert_eq!(likes, vec![23, 67, 45]);
        assert!(posts[1].is_liked);
        assert_eq!(cached_posts(&cache), posts);
        assert!(!repo.is_loading());
    }

    #[tokio::test]
    async fn load_remote_normalizes_and_mirrors() {
        let mut remote = online_remote();
        remote
            .expect_select()
            .withf(|collection, query| {
                collection == "posts" && query == &SelectQuery::newest_first("created_at", 20)
            })
            .returning(|_, _| {
                Ok(json!([{
                    "id": 5,
                    "content": "remote",
                    "mood": "rose",
                    "is_anonymous": true,
                    "author": "مجهول",
                    "likes_count": 3,
                    "isLiked": true,
                    "created_at": "2024-01-01T00:00:00Z"
                }]))
            });
        let cache = Arc::new(MapCache::default());
        let repo = repo(remote, cache.clone());

        let posts = repo.load().await;
        assert_eq!(posts.len(), 1);
        assert!(posts[0].hashtags.is_empty());
        assert!(!posts[0].is_liked);
        assert_eq!(cached_posts(&cache), posts);
    }

    #[tokio::test]
    async fn load_remote_keeps_rows_with_null_columns() {
        let mut remote = online_remote();
        remote.expect_select().returning(|_, _| {
            Ok(json!([
                {
                    "id": 1, "content": "أولى", "mood": "ocean", "is_anonymous": false,
                    "author": "هند", "likes_count": 2, "created_at": "2024-01-02T00:00:00Z"
                },
                {
                    "id": 2, "content": null, "mood": null, "is_anonymous": null,
                    "author": null, "hashtags": null, "likes_count": null,
                    "created_at": "2024-01-01T00:00:00Z"
                }
            ]))
        });
        let repo = repo(remote, Arc::new(MapCache::default()));

        let posts = repo.load().await;
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(posts[1].author, "");
        assert!(!posts[1].is_anonymous);
        assert_eq!(posts[1].mood, Mood::Emerald);
    }

    #[tokio::test]
    async fn load_remote_skips_only_malformed_rows() {
        let mut remote = online_remote();
        remote.expect_select().returning(|_, _| {
            Ok(json!([
                { "id": 1, "content": "سليمة", "created_at": "2024-01-02T00:00:00Z" },
                { "id": 2, "content": "بلا تاريخ" }
            ]))
        });
        let repo = repo(remote, Arc::new(MapCache::default()));

        let posts = repo.load().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "سليمة");
    }

    #[tokio::test]
    async fn load_remote_failure_uses_cache() {
        let cache = Arc::new(MapCache::default());
        let seeded = repo(offline_remote(), cache.clone());
        let mine = seeded.create("cached whisper", Mood::Emerald, true).await;

        let mut remote = online_remote();
        remote
            .expect_select()
            .returning(|_, _| Err(AppError::transport("offline")));
        let repo = repo(remote, cache.clone());

        assert_eq!(repo.load().await, vec![mine]);
    }

    #[tokio::test]
    async fn load_empty_remote_falls_through_to_seeds() {
        let mut remote = online_remote();
        remote.expect_select().returning(|_, _| Ok(json!([])));
        let repo = repo(remote, Arc::new(MapCache::default()));

        assert_eq!(repo.load().await.len(), 3);
    }

    #[tokio::test]
    async fn corrupt_cache_reads_as_absent() {
        let cache = Arc::new(MapCache::default());
        cache.put("khawater_posts", json!({ "not": "a list" }));
        let repo = repo(offline_remote(), cache.clone());

        assert_eq!(repo.load().await.len(), 3);
        assert_eq!(cached_posts(&cache).len(), 3);
    }

    #[tokio::test]
    async fn toggle_unknown_post_is_noop() {
        let repo = repo(offline_remote(), Arc::new(MapCache::default()));
        assert_eq!(repo.toggle_like(&PostId::new("missing")).await, None);
    }

    #[tokio::test]
    async fn toggle_twice_restores_original() {
        let mut remote = online_remote();
        remote.expect_select().returning(|_, _| Ok(Value::Null));
        remote
            .expect_update()
            .withf(|_, _, filter| filter.to_string() == "id=eq.1")
            .times(2)
            .returning(|_, patch, _| Ok(json!([patch])));
        let repo = repo(remote, Arc::new(MapCache::default()));
        let before = repo.load().await[0].like_state();

        let once = repo.toggle_like(&before.post_id).await.unwrap();
        assert!(once.is_liked);
        assert_eq!(once.likes_count, 24);

        let twice = repo.toggle_like(&before.post_id).await.unwrap();
        assert_eq!(twice, before);
    }

    #[tokio::test]
    async fn failed_update_rolls_back_and_signals_twice() {
        let mut remote = online_remote();
        remote.expect_select().returning(|_, _| Ok(Value::Null));
        remote
            .expect_update()
            .returning(|_, _, _| Err(AppError::remote(401, "bad key")));
        let cache = Arc::new(MapCache::default());
        let repo = repo(remote, cache.clone());
        let presenter = Arc::new(RecordingPresenter::default());
        repo.subscribe(presenter.clone());

        let before = repo.load().await[1].like_state();
        let after = repo.toggle_like(&before.post_id).await.unwrap();

        assert_eq!(after, before);
        assert_eq!(
            presenter.like_signals(),
            vec![
                (before.post_id.clone(), false, 66),
                (before.post_id.clone(), true, 67),
            ]
        );
        assert_eq!(cached_posts(&cache)[1].like_state(), before);
    }

    #[tokio::test]
    async fn abandoned_toggle_still_rolls_back() {
        let cache = Arc::new(MapCache::default());
        let repo = PostRepository::new(
            Arc::new(SlowRemote {
                select_delay: Duration::ZERO,
                update_delay: Duration::from_millis(200),
            }),
            cache.clone(),
            RepositoryOptions::default(),
            UserProfile::default(),
        );
        let before = repo.load().await[0].like_state();

        let waited =
            tokio::time::timeout(Duration::from_millis(20), repo.toggle_like(&before.post_id))
                .await;
        assert!(waited.is_err());
        assert!(repo.posts().await[0].is_liked);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(repo.posts().await[0].like_state(), before);
        assert_eq!(cached_posts(&cache)[0].like_state(), before);
    }

    #[tokio::test]
    async fn abandoned_load_lowers_loading_flag() {
        let repo = PostRepository::new(
            Arc::new(SlowRemote {
                select_delay: Duration::from_millis(200),
                update_delay: Duration::ZERO,
            }),
            Arc::new(MapCache::default()),
            RepositoryOptions::default(),
            UserProfile::default(),
        );

        let waited = tokio::time::timeout(Duration::from_millis(20), repo.load()).await;
        assert!(waited.is_err());
        assert!(!repo.is_loading());
    }

    #[tokio::test]
    async fn offline_toggle_keeps_optimistic_state() {
        let cache = Arc::new(MapCache::default());
        let repo = repo(offline_remote(), cache.clone());
        let post = repo.create("x", Mood::Emerald, false).await;

        let state = repo.toggle_like(&post.id).await.unwrap();
        assert!(state.is_liked);
        assert_eq!(state.likes_count, 1);
        assert_eq!(cached_posts(&cache)[0].likes_count, 1);
    }

    #[test]
    fn server_id_from_array_or_object() {
        assert_eq!(
            server_assigned_id(&json!([{ "id": "abc" }])),
            Some(PostId::new("abc"))
        );
        assert_eq!(server_assigned_id(&json!({ "id": 3 })), Some(PostId::new("3")));
        assert_eq!(server_assigned_id(&json!([])), None);
        assert_eq!(server_assigned_id(&Value::Null), None);
    }
}
