//! # kh-api
//!
//! The web routing and orchestration layer for Khawater.

pub mod handlers;
pub mod middleware;

pub use handlers::AppState;

use axum::routing::{get, post};
use axum::Router;

/// Builds the board's routes.
///
/// HTML routes serve the timeline page and its fragments; `/api` mirrors the
/// same three entry points as JSON.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/posts", post(handlers::create_post))
        .route("/posts/{id}/like", post(handlers::toggle_like))
        .route("/api/posts", get(handlers::api_list).post(handlers::api_create))
        .route("/api/posts/{id}/like", post(handlers::api_toggle_like))
        .route("/healthz", get(handlers::healthz))
        .layer(middleware::cors_policy())
        .layer(middleware::compression())
        .layer(middleware::standard_middleware())
        .with_state(state)
}
