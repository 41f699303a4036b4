//! Regent Core - shared types for the Regent policy decision front-end
//!
//! This crate provides the types every other Regent crate speaks:
//! - Rule modules, configuration documents, request inputs and decisions
//! - The error taxonomy for load, bind, build and evaluation stages
//! - Cancellation signals accepted by every entry point

pub mod cancel;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use cancel::Cancellation;
pub use error::{
    BindError, BindErrorKind, BuildError, BuildErrorKind, CancelReason, Cancelled, EvalError,
    EvalErrorKind, LoadError, LoadErrorKind, RegentError, Result,
};
pub use types::{ConfigDocument, Decision, RequestInput, RuleModule};

/// Tree-structured value used for configuration, input and decisions
pub use serde_json::Value;
