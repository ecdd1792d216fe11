//! # Khawater Binary
//!
//! The entry point that assembles the board from configuration and serves it.

use std::sync::Arc;

use anyhow::Context;
use configs::Settings;
use kh_api::{router, AppState};
use kh_core::controller::BoardController;
use kh_core::models::UserProfile;
use kh_core::repository::{PostRepository, RepositoryOptions};
use kh_core::traits::{LocalCache, RemoteStore};
use kh_remote_rest::RestRemoteStore;
use kh_ui::HtmlPresenter;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PAGE_TITLE: &str = "خواطر - همسات الروح";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings);

    let address = settings.bind_address();
    let max_post_length = settings.board.max_post_length;

    // 1. Local cache
    let cache = local_cache(&settings);

    // 2. Remote store; offline when the endpoint or key is missing
    let remote = RestRemoteStore::new(settings.remote.url, settings.remote.api_key);
    if remote.is_configured() {
        info!(url = %remote.base_url(), "remote store configured");
    } else {
        warn!("remote store not configured; running on the local cache only");
    }

    // 3. Repository, presenter and controller
    let repo = Arc::new(PostRepository::new(
        Arc::new(remote),
        cache,
        RepositoryOptions {
            collection: settings.remote.collection,
            storage_key: settings.board.storage_key,
            page_size: settings.board.posts_per_page,
        },
        UserProfile::named(settings.board.user_name),
    ));
    let presenter = Arc::new(HtmlPresenter::new(PAGE_TITLE, max_post_length));
    let board = Arc::new(BoardController::new(repo, presenter.clone(), max_post_length));

    let posts = board.load_and_render().await;
    info!(count = posts.len(), "timeline ready");

    let app = router(AppState::new(board, presenter));
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;

    info!("Khawater listening on http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    info!("shut down");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(feature = "cache-file")]
fn local_cache(settings: &Settings) -> Arc<dyn LocalCache> {
    use kh_cache_local::FileCache;

    if settings.cache.dir.trim().is_empty() {
        return Arc::new(kh_cache_local::MemoryCache::new());
    }
    let quota = (settings.cache.quota_bytes > 0).then_some(settings.cache.quota_bytes);
    info!(dir = %settings.cache.dir, ?quota, "file cache");
    Arc::new(FileCache::new(settings.cache.dir.clone().into()).with_quota(quota))
}

#[cfg(not(feature = "cache-file"))]
fn local_cache(_settings: &Settings) -> Arc<dyn LocalCache> {
    Arc::new(kh_cache_local::MemoryCache::new())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
