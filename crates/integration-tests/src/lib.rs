//! Shared fixtures for the end-to-end tests: an in-process stand-in for the
//! REST backend and builders for fully wired repositories.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use kh_cache_local::{FileCache, MemoryCache};
use kh_core::models::UserProfile;
use kh_core::repository::{PostRepository, RepositoryOptions};
use kh_core::traits::LocalCache;
use kh_remote_rest::RestRemoteStore;
use secrecy::SecretString;
use serde_json::{json, Value};

/// Minimal PostgREST look-alike for the `posts` collection.
///
/// Rows are kept newest first; inserts get sequential integer ids, the way
/// a serial primary key would assign them.
#[derive(Clone, Default)]
pub struct FakeBackend {
    rows: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    requests: Arc<AtomicU64>,
}

impl FakeBackend {
    /// Starts serving on an ephemeral port and returns the base URL.
    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route(
                "/rest/v1/posts",
                get(select).post(insert).patch(update).delete(remove),
            )
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake backend");
        });
        format!("http://{addr}")
    }

    /// Makes every following request answer 500.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), (StatusCode, String)> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err((StatusCode::INTERNAL_SERVER_ERROR, "backend down".to_string()))
        } else {
            Ok(())
        }
    }
}

type Reply = Result<Json<Value>, (StatusCode, String)>;

fn id_filter(query: &HashMap<String, String>) -> Option<String> {
    query.get("id")?.strip_prefix("eq.").map(str::to_string)
}

fn id_matches(row: &Value, wanted: &str) -> bool {
    match &row["id"] {
        Value::Number(n) => n.to_string() == wanted,
        Value::String(s) => s == wanted,
        _ => false,
    }
}

async fn select(
    State(backend): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.check()?;
    let limit = query
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let rows: Vec<Value> = backend.rows().into_iter().take(limit).collect();
    Ok(Json(Value::Array(rows)))
}

async fn insert(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Reply {
    backend.check()?;
    let mut created = Vec::new();
    for mut row in body.as_array().cloned().unwrap_or_default() {
        let id = backend.next_id.fetch_add(1, Ordering::SeqCst) + 100;
        row["id"] = json!(id);
        created.push(row);
    }
    let mut rows = backend.rows.lock().unwrap();
    for row in created.iter().rev() {
        rows.insert(0, row.clone());
    }
    Ok(Json(Value::Array(created)))
}

async fn update(
    State(backend): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
    Json(patch): Json<Value>,
) -> Reply {
    backend.check()?;
    let wanted = id_filter(&query).unwrap_or_default();
    let mut rows = backend.rows.lock().unwrap();
    let mut updated = Vec::new();
    for row in rows.iter_mut().filter(|r| id_matches(r, &wanted)) {
        if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        updated.push(row.clone());
    }
    Ok(Json(Value::Array(updated)))
}

async fn remove(
    State(backend): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    backend.check()?;
    let wanted = id_filter(&query).unwrap_or_default();
    let mut rows = backend.rows.lock().unwrap();
    let (gone, kept): (Vec<Value>, Vec<Value>) =
        rows.drain(..).partition(|r| id_matches(r, &wanted));
    *rows = kept;
    Ok(Json(Value::Array(gone)))
}

/// A repository talking to `base_url` with the given cache.
pub fn repository(base_url: &str, cache: Arc<dyn LocalCache>) -> PostRepository {
    PostRepository::new(
        Arc::new(RestRemoteStore::new(
            base_url,
            SecretString::from("test-anon-key".to_string()),
        )),
        cache,
        RepositoryOptions::default(),
        UserProfile::named("سارة"),
    )
}

/// A repository with no remote at all.
pub fn offline_repository(cache: Arc<dyn LocalCache>) -> PostRepository {
    PostRepository::new(
        Arc::new(RestRemoteStore::unconfigured()),
        cache,
        RepositoryOptions::default(),
        UserProfile::default(),
    )
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new())
}

pub fn file_cache(dir: &std::path::Path) -> Arc<FileCache> {
    Arc::new(FileCache::new(dir.to_path_buf()))
}
