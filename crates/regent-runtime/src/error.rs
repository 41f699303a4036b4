//! Engine error types

use thiserror::Error;

/// Error reported by a rule engine implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A rule module failed to parse or compile
    #[error("Compile error: {0}")]
    Compile(String),

    /// The query could not be parsed
    #[error("Query syntax error: {0}")]
    QuerySyntax(String),

    /// Data could not be converted or registered
    #[error("Data error: {0}")]
    Data(String),

    /// Evaluation failed
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
