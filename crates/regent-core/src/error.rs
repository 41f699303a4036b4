//! Error taxonomy for the Regent pipeline
//!
//! Each pipeline stage has its own error type with a classifying kind:
//! loading ([`LoadError`]), binding ([`BindError`]), plan construction
//! ([`BuildError`]) and execution ([`EvalError`]). Cancellation is reported
//! separately as [`Cancelled`] by every stage. [`RegentError`] collects them.

use std::fmt;
use thiserror::Error;

/// Classification of a bundle load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    NotFound,
    ReadFailure,
    ParseFailure,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadErrorKind::NotFound => write!(f, "not found"),
            LoadErrorKind::ReadFailure => write!(f, "read failure"),
            LoadErrorKind::ParseFailure => write!(f, "parse failure"),
        }
    }
}

/// Bundle could not be loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Load error ({kind}) at {path}: {detail}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub path: String,
    pub detail: String,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::NotFound, path, "no such file or directory")
    }
}

/// Classification of a data binding failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindErrorKind {
    SerializationFailure,
    UnsupportedShape,
}

impl fmt::Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindErrorKind::SerializationFailure => write!(f, "serialization failure"),
            BindErrorKind::UnsupportedShape => write!(f, "unsupported shape"),
        }
    }
}

/// Configuration document cannot be represented by the chosen strategy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Bind error ({kind}): {detail}")]
pub struct BindError {
    pub kind: BindErrorKind,
    pub detail: String,
}

impl BindError {
    pub fn new(kind: BindErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unsupported_shape(detail: impl Into<String>) -> Self {
        Self::new(BindErrorKind::UnsupportedShape, detail)
    }

    pub fn serialization(detail: impl Into<String>) -> Self {
        Self::new(BindErrorKind::SerializationFailure, detail)
    }
}

/// Classification of a plan construction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildErrorKind {
    CompileFailure,
    QuerySyntaxError,
}

impl fmt::Display for BuildErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildErrorKind::CompileFailure => write!(f, "compile failure"),
            BuildErrorKind::QuerySyntaxError => write!(f, "query syntax error"),
        }
    }
}

/// Evaluation plan could not be prepared
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Build error ({kind}): {detail}")]
pub struct BuildError {
    pub kind: BuildErrorKind,
    pub detail: String,
}

impl BuildError {
    pub fn new(kind: BuildErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Classification of an execution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// The engine reported an error while evaluating
    RuntimeFailure,
    /// Evaluation succeeded but produced no value
    NoResult,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::RuntimeFailure => write!(f, "runtime failure"),
            EvalErrorKind::NoResult => write!(f, "no result"),
        }
    }
}

/// A single evaluation failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Evaluation error ({kind}): {detail}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub detail: String,
}

impl EvalError {
    pub fn runtime(detail: impl Into<String>) -> Self {
        Self {
            kind: EvalErrorKind::RuntimeFailure,
            detail: detail.into(),
        }
    }

    pub fn no_result(detail: impl Into<String>) -> Self {
        Self {
            kind: EvalErrorKind::NoResult,
            detail: detail.into(),
        }
    }
}

/// Why an operation was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired
    Requested,
    /// The deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => write!(f, "cancellation requested"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// An operation stopped because of cancellation or a deadline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} cancelled: {reason}")]
pub struct Cancelled {
    pub stage: &'static str,
    pub reason: CancelReason,
}

/// Top-level error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegentError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Invalid engine or bundle configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegentError {
    /// True when evaluation succeeded but produced no value
    pub fn is_no_result(&self) -> bool {
        matches!(self, RegentError::Eval(e) if e.kind == EvalErrorKind::NoResult)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RegentError::Cancelled(_))
    }
}

/// Result type for Regent operations
pub type Result<T> = std::result::Result<T, RegentError>;
