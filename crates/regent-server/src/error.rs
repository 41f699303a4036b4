//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regent_core::{CancelReason, EvalErrorKind, RegentError};
use serde_json::json;
use thiserror::Error;

/// Server error type
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The query does not parse or the rules do not compile
    #[error("Query error: {0}")]
    QueryError(String),

    /// Evaluation produced no decision
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rule engine failure while evaluating
    #[error("Engine error: {0}")]
    EngineError(String),

    /// Evaluation deadline passed
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Request cancelled, typically during shutdown
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) | ServerError::QueryError(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::EngineError(_) | ServerError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<RegentError> for ServerError {
    fn from(err: RegentError) -> Self {
        let message = err.to_string();
        match err {
            RegentError::Eval(e) if e.kind == EvalErrorKind::NoResult => {
                ServerError::NotFound(message)
            }
            RegentError::Eval(_) => ServerError::EngineError(message),
            RegentError::Build(_) => ServerError::QueryError(message),
            RegentError::Cancelled(c) if c.reason == CancelReason::DeadlineExceeded => {
                ServerError::Timeout(message)
            }
            RegentError::Cancelled(_) => ServerError::Unavailable(message),
            RegentError::Load(_) | RegentError::Bind(_) | RegentError::Config(_) => {
                ServerError::InternalError(message)
            }
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_core::{BuildError, BuildErrorKind, Cancelled, EvalError, LoadError};

    #[test]
    fn test_no_result_is_not_found() {
        let err: ServerError = RegentError::from(EvalError::no_result("undefined")).into();
        assert!(matches!(err, ServerError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_runtime_failure_is_engine_error() {
        let err: ServerError = RegentError::from(EvalError::runtime("type error")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("type error"));
    }

    #[test]
    fn test_build_error_is_bad_request() {
        let err: ServerError = RegentError::from(BuildError::new(
            BuildErrorKind::QuerySyntaxError,
            "unexpected token",
        ))
        .into();
        assert!(matches!(err, ServerError::QueryError(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_deadline_is_gateway_timeout() {
        let err: ServerError = RegentError::from(Cancelled {
            stage: "execute",
            reason: CancelReason::DeadlineExceeded,
        })
        .into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_requested_cancellation_is_unavailable() {
        let err: ServerError = RegentError::from(Cancelled {
            stage: "execute",
            reason: CancelReason::Requested,
        })
        .into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_load_error_is_internal() {
        let err: ServerError = RegentError::from(LoadError::not_found("data.json")).into();
        assert!(matches!(err, ServerError::InternalError(_)));
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let server_err: ServerError = anyhow::anyhow!("something went wrong").into();
        assert!(server_err.to_string().contains("Internal error"));
        assert!(server_err.to_string().contains("something went wrong"));
    }

    #[test]
    fn test_into_response_status() {
        let response = ServerError::InvalidRequest("bad input".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerError>();
    }
}
