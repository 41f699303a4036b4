//! REST API type definitions

use regent_sdk::PolicyEngine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PolicyEngine>,

    /// Cancelled when the server starts shutting down
    pub shutdown: CancellationToken,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Evaluation request payload
#[derive(Debug, Deserialize)]
pub struct EvaluateRequestPayload {
    /// Query to evaluate, e.g. `data.authz.allow`
    pub query: String,

    /// Per-request input, available to rules as `input`
    #[serde(default = "empty_input")]
    pub input: Value,
}

fn empty_input() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Evaluation response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponsePayload {
    /// Decision value
    pub result: Value,

    /// The evaluated query
    pub query: String,

    /// Rule set generation that produced the decision
    pub generation: u64,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Reload response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub generation: u64,
}
