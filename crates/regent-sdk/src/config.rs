//! Configuration types for PolicyEngine

use crate::binding::BindingStrategy;
use regent_repository::BundleConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default data namespace the configuration document is bound under
pub const DEFAULT_NAMESPACE: &str = "config";

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bundle to load rule modules and the configuration document from
    pub bundle: Option<BundleConfig>,

    /// How the configuration document is exposed to rules
    pub strategy: BindingStrategy,

    /// Dotted data namespace, `data.<namespace>` inside rules
    pub namespace: String,

    /// Queries prepared at build time and on every reload
    pub queries: Vec<String>,

    /// Deadline applied to `evaluate` calls, in milliseconds
    pub timeout_ms: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            bundle: None,
            strategy: BindingStrategy::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            queries: Vec::new(),
            timeout_ms: None,
        }
    }

    pub fn with_bundle(mut self, bundle: BundleConfig) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn with_strategy(mut self, strategy: BindingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Add a query to prepare eagerly
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.queries.push(query.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert!(config.bundle.is_none());
        assert_eq!(config.strategy, BindingStrategy::ParsedValue);
        assert_eq!(config.namespace, "config");
        assert!(config.queries.is_empty());
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::new()
            .with_bundle(BundleConfig::file_system("policies"))
            .with_strategy(BindingStrategy::Store)
            .with_namespace("app.settings")
            .with_query("data.authz.allow")
            .with_timeout(Duration::from_millis(250));

        assert_eq!(config.strategy, BindingStrategy::Store);
        assert_eq!(config.namespace, "app.settings");
        assert_eq!(config.queries, vec!["data.authz.allow".to_string()]);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let config: EngineConfig =
            serde_yaml::from_str("strategy: synthetic_module\nqueries:\n  - data.authz.allow\n")
                .unwrap();

        assert_eq!(config.strategy, BindingStrategy::SyntheticModule);
        assert_eq!(config.namespace, "config");
        assert_eq!(config.queries.len(), 1);
    }
}
