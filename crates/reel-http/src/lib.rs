//! HTTP boundary (axum).
//!
//! One retrieval endpoint. Every response carries permissive cross-origin
//! headers; the handler itself decides preflight, method and configuration
//! outcomes before running the pipeline.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::any,
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use reel_core::config::Config;

pub mod error;
pub mod handlers;

pub use error::ApiError;

pub const VIDEOS_ROUTE: &str = "/api/getVideos";

/// Methods advertised to cross-origin callers.
pub const CORS_METHODS: &str = "GET, OPTIONS";

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>) -> Self {
        Self { cfg }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Every verb reaches the handler so it can answer 405 itself.
        .route(VIDEOS_ROUTE, any(handlers::get_videos))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
