//! Regent SDK
//!
//! High-level API for policy decisions: load a bundle, bind its
//! configuration document with one of four strategies, prepare evaluation
//! plans and execute them against per-request input.
//!
//! ```rust,ignore
//! use regent_sdk::{BindingStrategy, BundleConfig, PolicyEngineBuilder};
//! use serde_json::json;
//!
//! let engine = PolicyEngineBuilder::new()
//!     .with_bundle(BundleConfig::file_system("policies"))
//!     .with_strategy(BindingStrategy::ParsedValue)
//!     .add_query("data.authz.allow")
//!     .build()
//!     .await?;
//!
//! let response = engine
//!     .evaluate("data.authz.allow", json!({"payload": {"role": "admin"}}))
//!     .await?;
//! assert_eq!(response.decision.as_bool(), Some(true));
//! ```

pub mod binding;
pub mod builder;
pub mod config;
pub mod plan;
pub mod policy_engine;
pub mod synthetic;

// Re-export main types
pub use binding::{
    BindingArtifact, BindingStrategy, DataBinder, DataNamespace, ENVELOPE_CONFIG_FIELD,
    ENVELOPE_PAYLOAD_FIELD,
};
pub use builder::PolicyEngineBuilder;
pub use config::EngineConfig;
pub use plan::{EvaluationPlan, PlanBuilder};
pub use policy_engine::{EvaluationResponse, PolicyEngine};

// Re-export commonly used types from dependencies
pub use regent_core::{
    Cancellation, ConfigDocument, Decision, RegentError, RequestInput, Result, RuleModule, Value,
};
pub use regent_repository::{Bundle, BundleConfig, BundleSource, FileSystemBundle, MemoryBundle};
pub use regent_runtime::{DocumentStore, RegoEngine, RuleEngine};
