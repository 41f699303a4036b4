//! Builder pattern for PolicyEngine

use crate::binding::{BindingStrategy, DataBinder, DataNamespace};
use crate::config::EngineConfig;
use crate::plan::PlanBuilder;
use crate::policy_engine::{ContentSource, PolicyEngine};
use regent_core::{Cancellation, ConfigDocument, RegentError, Result, RuleModule, Value};
use regent_repository::{Bundle, BundleConfig, BundleLayout, BundleLoader};
use regent_runtime::{RegoEngine, RuleEngine};
use std::sync::Arc;
use std::time::Duration;

/// Builder for PolicyEngine
///
/// # Example
///
/// ```rust,ignore
/// use regent_sdk::{BindingStrategy, BundleConfig, PolicyEngineBuilder};
///
/// // From a bundle on disk
/// let engine = PolicyEngineBuilder::new()
///     .with_bundle(BundleConfig::file_system("policies"))
///     .with_strategy(BindingStrategy::Store)
///     .add_query("data.authz.allow")
///     .build()
///     .await?;
///
/// // Manual content (for testing or embedding)
/// let engine = PolicyEngineBuilder::new()
///     .add_module_content("authz.rego", rego_source)
///     .with_config_document(json!({"roles": ["admin"]}))
///     .build()
///     .await?;
/// ```
pub struct PolicyEngineBuilder {
    config: EngineConfig,
    bundle: Option<Arc<dyn Bundle>>,
    modules: Vec<RuleModule>,
    document: Option<Value>,
    engine: Option<Arc<dyn RuleEngine>>,
}

impl PolicyEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            bundle: None,
            modules: Vec::new(),
            document: None,
            engine: None,
        }
    }

    /// Start from a complete engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Load rule modules and the configuration document from a bundle
    pub fn with_bundle(mut self, bundle: BundleConfig) -> Self {
        self.config.bundle = Some(bundle);
        self
    }

    /// Load from an already opened bundle
    ///
    /// The layout (rule extension, configuration document path) still comes
    /// from the bundle configuration when one is set.
    pub fn with_bundle_handle(mut self, bundle: Arc<dyn Bundle>) -> Self {
        self.bundle = Some(bundle);
        self
    }

    /// Add rule source directly
    ///
    /// # Arguments
    /// * `id` - Logical path of the module (e.g., `authz/rbac.rego`)
    /// * `source` - Rego source text
    pub fn add_module_content(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.modules.push(RuleModule::new(id, source));
        self
    }

    /// Set the configuration document directly
    ///
    /// Takes precedence over the bundle's document.
    pub fn with_config_document(mut self, document: Value) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_strategy(mut self, strategy: BindingStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the dotted data namespace (default `config`)
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Prepare `query` at build time and on every reload
    pub fn add_query(mut self, query: impl Into<String>) -> Self {
        self.config.queries.push(query.into());
        self
    }

    /// Deadline applied to every `evaluate` call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Use a rule engine other than the default `regorus` one
    pub fn with_engine(mut self, engine: Arc<dyn RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the policy engine
    ///
    /// Loads, binds and prepares every configured query. Any failure is
    /// returned and no engine is produced.
    pub async fn build(self) -> Result<PolicyEngine> {
        self.build_with(&Cancellation::new()).await
    }

    pub async fn build_with(self, cancel: &Cancellation) -> Result<PolicyEngine> {
        let namespace = DataNamespace::parse(&self.config.namespace)?;

        let document = match self.document {
            Some(value) => Some(ConfigDocument::from_value(value).ok_or_else(|| {
                RegentError::Config(
                    "configuration document must be an object or an array".to_string(),
                )
            })?),
            None => None,
        };

        let loader = match (self.bundle, &self.config.bundle) {
            (Some(bundle), config) => Some(
                BundleLoader::new(bundle)
                    .with_layout(config.as_ref().map(BundleLayout::from).unwrap_or_default()),
            ),
            (None, Some(config)) => Some(BundleLoader::from_config(config)?),
            (None, None) => None,
        };

        let source = ContentSource {
            loader,
            modules: self.modules,
            document,
        };
        let binder = DataBinder::new(self.config.strategy, namespace);
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(RegoEngine::new()) as Arc<dyn RuleEngine>);

        PolicyEngine::new(self.config, source, binder, PlanBuilder::new(engine), cancel).await
    }
}

impl Default for PolicyEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_builder_without_content() {
        let engine = PolicyEngineBuilder::new().build().await;
        assert!(engine.is_ok());
    }

    #[test]
    fn test_builder_with_multiple_options() {
        let builder = PolicyEngineBuilder::new()
            .with_strategy(BindingStrategy::SyntheticModule)
            .with_namespace("app")
            .add_query("data.a.allow")
            .add_query("data.b.allow")
            .add_module_content("a.rego", "package a")
            .with_timeout(Duration::from_secs(1));

        assert_eq!(builder.config.strategy, BindingStrategy::SyntheticModule);
        assert_eq!(builder.config.namespace, "app");
        assert_eq!(builder.config.queries.len(), 2);
        assert_eq!(builder.modules.len(), 1);
        assert_eq!(builder.config.timeout(), Some(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_invalid_namespace_is_config_error() {
        let result = PolicyEngineBuilder::new()
            .with_namespace("not-valid")
            .build()
            .await;

        assert!(matches!(result, Err(RegentError::Config(_))));
    }

    #[tokio::test]
    async fn test_scalar_document_is_config_error() {
        let result = PolicyEngineBuilder::new()
            .with_config_document(json!(42))
            .build()
            .await;

        assert!(matches!(result, Err(RegentError::Config(_))));
    }

    #[tokio::test]
    async fn test_preloaded_query_failure_is_fatal() {
        let result = PolicyEngineBuilder::new()
            .add_module_content("broken.rego", "package broken\n\nallow if {")
            .add_query("data.broken.allow")
            .build()
            .await;

        assert!(matches!(result, Err(RegentError::Build(_))));
    }
}
