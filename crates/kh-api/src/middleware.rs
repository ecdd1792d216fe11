//! khawater/crates/kh-api/src/middleware.rs Middleware
//!
//! Tower layers for request logging and traffic shaping.

use axum::http::Method;
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Request/response spans through `tracing`.
pub fn standard_middleware() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// The JSON API may be called from another origin; only reads and posts.
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .max_age(Duration::from_secs(3600))
}

pub fn compression() -> CompressionLayer {
    CompressionLayer::new()
}
