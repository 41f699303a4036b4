//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use regent_sdk::PolicyEngine;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create REST API router
///
/// Evaluations still running when `shutdown` is cancelled stop with 503.
pub fn create_router(engine: Arc<PolicyEngine>, shutdown: CancellationToken) -> Router {
    let state = AppState { engine, shutdown };

    Router::new()
        .route("/health", get(health))
        .route("/v1/evaluate", post(evaluate))
        .route("/v1/repo/reload", post(reload_repository))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
