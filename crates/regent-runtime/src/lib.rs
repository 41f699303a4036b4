//! Regent Runtime - the seam between orchestration and the rule engine
//!
//! This crate provides:
//! - [`RuleEngine`] / [`PreparedQuery`]: the four-operation engine contract
//!   (module registration, data registration, query preparation, execution)
//! - [`RegoEngine`]: the contract implemented on top of `regorus`
//! - [`DocumentStore`]: the transactional in-memory store used as a backing
//!   data store

pub mod engine;
pub mod error;
pub mod rego;
pub mod store;

// Re-export main types
pub use engine::{
    DataSource, ExpressionValue, PrepareRequest, PreparedQuery, ResultSet, RuleEngine,
};
pub use error::{EngineError, Result};
pub use rego::RegoEngine;
pub use store::{DocumentStore, StoreError, StoreSnapshot};
