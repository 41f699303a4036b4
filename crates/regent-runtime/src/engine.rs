//! Rule engine contract
//!
//! The orchestration core depends only on this contract, never on an
//! engine's rule semantics:
//!
//! 1. module registration (`PrepareRequest::modules`)
//! 2. data registration, as a parsed value or a backing store
//!    (`PrepareRequest::data`)
//! 3. query preparation ([`RuleEngine::prepare`])
//! 4. execution against a structured input ([`PreparedQuery::eval`])
//!
//! Registration and preparation happen in one call so a failed preparation
//! never leaves partially registered state behind.

use crate::error::Result;
use crate::store::DocumentStore;
use regent_core::{RuleModule, Value};
use std::fmt;
use std::sync::Arc;

/// Static data registered with the engine for the lifetime of a plan
#[derive(Debug, Clone, Default)]
pub enum DataSource {
    /// No static data
    #[default]
    None,
    /// Pre-parsed value merged at the data root; must be an object
    Value(Value),
    /// Backing store read once per evaluation
    Store(DocumentStore),
}

/// Everything the engine needs to prepare a query
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    pub query: String,
    pub modules: Vec<RuleModule>,
    pub data: DataSource,
}

impl PrepareRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            modules: Vec::new(),
            data: DataSource::None,
        }
    }

    pub fn with_modules(mut self, modules: Vec<RuleModule>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_data(mut self, data: DataSource) -> Self {
        self.data = data;
        self
    }
}

/// One evaluated expression of a result set
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionValue {
    /// Source text of the expression
    pub text: String,
    pub value: Value,
}

/// One solution of a query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub expressions: Vec<ExpressionValue>,
}

/// A prepared, reusable query
///
/// Implementations hold no per-call mutable state: `eval` may be called
/// concurrently from many threads.
pub trait PreparedQuery: Send + Sync + fmt::Debug {
    /// The query this plan answers
    fn query(&self) -> &str;

    /// Evaluate against `input`, returning zero or more result sets
    ///
    /// Undefined results are reported as an empty vector, not as an error.
    fn eval(&self, input: Option<&Value>) -> Result<Vec<ResultSet>>;
}

/// A rule-evaluation engine
pub trait RuleEngine: Send + Sync {
    /// Engine name, used in logs
    fn name(&self) -> &str;

    /// Register modules and data, then prepare `request.query`
    ///
    /// Module failures are reported as [`crate::EngineError::Compile`],
    /// malformed queries as [`crate::EngineError::QuerySyntax`].
    fn prepare(&self, request: PrepareRequest) -> Result<Arc<dyn PreparedQuery>>;
}
