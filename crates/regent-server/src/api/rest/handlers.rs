//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{extract::State, Json};
use regent_sdk::{Cancellation, RequestInput};
use tracing::{error, info, warn};

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Evaluation endpoint
#[axum::debug_handler]
pub(super) async fn evaluate(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<EvaluateRequestPayload>,
) -> Result<Json<EvaluateResponsePayload>, ServerError> {
    info!("Received evaluation request for `{}`", payload.query);

    let cancel = state
        .engine
        .with_default_timeout(Cancellation::with_token(state.shutdown.child_token()));
    let response = state
        .engine
        .evaluate_with(&payload.query, RequestInput::new(payload.input), &cancel)
        .await
        .map_err(|e| {
            if e.is_no_result() {
                info!("No decision for `{}`", payload.query);
            } else {
                warn!("Evaluation of `{}` failed: {}", payload.query, e);
            }
            ServerError::from(e)
        })?;

    Ok(Json(EvaluateResponsePayload {
        result: response.decision.into_value(),
        query: response.query,
        generation: response.generation,
        processing_time_ms: response.processing_time_ms,
    }))
}

/// Reload bundle endpoint
pub(super) async fn reload_repository(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ServerError> {
    info!("Received bundle reload request");

    state.engine.reload().await.map_err(|e| {
        error!("Failed to reload bundle: {}", e);
        ServerError::InternalError(format!("Failed to reload bundle: {}", e))
    })?;

    let generation = state.engine.generation().await;
    info!("Bundle reloaded, serving generation {}", generation);
    Ok(Json(ReloadResponse {
        success: true,
        message: "Bundle reloaded successfully".to_string(),
        generation,
    }))
}
