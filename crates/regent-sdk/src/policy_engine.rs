//! PolicyEngine - Main API for evaluating policy decisions

use crate::binding::{BindingArtifact, BindingStrategy, DataBinder};
use crate::config::EngineConfig;
use crate::plan::{EvaluationPlan, PlanBuilder};
use regent_core::{
    BuildError, BuildErrorKind, Cancellation, ConfigDocument, Decision, RegentError,
    RequestInput, Result, RuleModule,
};
use regent_repository::{BundleLoader, LoadedBundle};
use regent_runtime::DocumentStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, warn};

/// Upper bound on plans kept per generation
const PLAN_CACHE_CAPACITY: usize = 1024;

const BUILD_STAGE: &str = "build";

/// A cached plan, filled by the first build that completes
type PlanSlot = Arc<OnceCell<Arc<EvaluationPlan>>>;

/// Evaluation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// The query that was evaluated
    pub query: String,

    /// Decision value
    pub decision: Decision,

    /// Generation of the rule set that answered, bumped on every reload
    pub generation: u64,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Where rule modules and the configuration document come from
pub(crate) struct ContentSource {
    pub(crate) loader: Option<BundleLoader>,
    pub(crate) modules: Vec<RuleModule>,
    pub(crate) document: Option<ConfigDocument>,
}

impl ContentSource {
    /// Load the bundle, if any, and merge in directly supplied content
    async fn load(&self, cancel: &Cancellation) -> Result<LoadedBundle> {
        let mut loaded = match &self.loader {
            Some(loader) => loader.load_all(cancel).await?,
            None => LoadedBundle {
                modules: Vec::new(),
                config: ConfigDocument::empty(),
            },
        };

        if let Some(document) = &self.document {
            loaded.config = document.clone();
        }
        for module in &self.modules {
            if loaded.modules.iter().any(|m| m.id == module.id) {
                return Err(RegentError::Config(format!(
                    "duplicate rule module {}",
                    module.id
                )));
            }
            loaded.modules.push(module.clone());
        }
        loaded.modules.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(loaded)
    }
}

/// One loaded, bound rule set and the plans prepared over it
struct EngineState {
    generation: u64,
    modules: Vec<RuleModule>,
    artifact: BindingArtifact,
    plans: RwLock<HashMap<String, PlanSlot>>,
}

impl EngineState {
    /// The cache slot for `query`, or `None` when the cache is full
    async fn slot(&self, query: &str) -> Option<PlanSlot> {
        if let Some(slot) = self.plans.read().await.get(query) {
            return Some(Arc::clone(slot));
        }

        let mut plans = self.plans.write().await;
        if let Some(slot) = plans.get(query) {
            return Some(Arc::clone(slot));
        }
        if plans.len() >= PLAN_CACHE_CAPACITY {
            return None;
        }
        let slot = PlanSlot::default();
        plans.insert(query.to_string(), Arc::clone(&slot));
        Some(slot)
    }

    /// Drop an empty slot so a query that failed to build holds no entry
    async fn forget(&self, query: &str, slot: &PlanSlot) {
        let mut plans = self.plans.write().await;
        if let Some(existing) = plans.get(query) {
            if Arc::ptr_eq(existing, slot) && !slot.initialized() {
                plans.remove(query);
            }
        }
    }
}

/// Main policy engine
///
/// Loads and binds once, prepares one plan per distinct query and answers
/// `evaluate` calls concurrently. [`PolicyEngine::reload`] swaps in a freshly
/// loaded rule set without interrupting calls already in flight.
pub struct PolicyEngine {
    config: EngineConfig,
    source: ContentSource,
    binder: DataBinder,
    planner: PlanBuilder,

    /// Current rule set, replaced wholesale on reload
    state: RwLock<Arc<EngineState>>,

    /// Serializes reloads
    reload_lock: Mutex<()>,
}

impl PolicyEngine {
    pub(crate) async fn new(
        config: EngineConfig,
        source: ContentSource,
        binder: DataBinder,
        planner: PlanBuilder,
        cancel: &Cancellation,
    ) -> Result<Self> {
        let state = assemble(&config, &source, &binder, &planner, 1, cancel).await?;

        info!(
            "Policy engine ready: {} modules, {} binding, {} prepared queries",
            state.modules.len(),
            binder.strategy(),
            config.queries.len()
        );

        Ok(Self {
            config,
            source,
            binder,
            planner,
            state: RwLock::new(Arc::new(state)),
            reload_lock: Mutex::new(()),
        })
    }

    /// Evaluate `query` against `input` under the configured timeout
    pub async fn evaluate(
        &self,
        query: &str,
        input: impl Into<RequestInput>,
    ) -> Result<EvaluationResponse> {
        let cancel = self.with_default_timeout(Cancellation::new());
        self.evaluate_with(query, input.into(), &cancel).await
    }

    /// Evaluate `query` against `input` under the caller's cancellation
    pub async fn evaluate_with(
        &self,
        query: &str,
        input: RequestInput,
        cancel: &Cancellation,
    ) -> Result<EvaluationResponse> {
        let start = Instant::now();

        let state = self.current().await;
        let plan = self.plan_for(&state, query, cancel).await?;
        let decision = plan.execute(input, cancel).await?;

        Ok(EvaluationResponse {
            query: query.to_string(),
            decision,
            generation: state.generation,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// The prepared plan for `query`, building and caching it on first use
    pub async fn plan(&self, query: &str, cancel: &Cancellation) -> Result<Arc<EvaluationPlan>> {
        let state = self.current().await;
        self.plan_for(&state, query, cancel).await
    }

    /// Reload modules and the configuration document and swap them in
    ///
    /// Every configured query is prepared against the new rule set before
    /// the swap. On failure the current rule set keeps serving.
    pub async fn reload(&self) -> Result<()> {
        self.reload_with(&Cancellation::new()).await
    }

    pub async fn reload_with(&self, cancel: &Cancellation) -> Result<()> {
        let _guard = self.reload_lock.lock().await;
        let generation = self.current().await.generation + 1;

        let state = assemble(
            &self.config,
            &self.source,
            &self.binder,
            &self.planner,
            generation,
            cancel,
        )
        .await
        .map_err(|e| {
            warn!("Reload failed, keeping generation {}: {}", generation - 1, e);
            e
        })?;

        *self.state.write().await = Arc::new(state);
        info!("Reloaded rule set, now serving generation {}", generation);
        Ok(())
    }

    /// Generation of the rule set currently serving
    pub async fn generation(&self) -> u64 {
        self.current().await.generation
    }

    /// Modules of the rule set currently serving
    pub async fn modules(&self) -> Vec<RuleModule> {
        self.current().await.modules.clone()
    }

    /// The backing store of a `store` binding
    ///
    /// Writes are visible to the next evaluation. A reload replaces the
    /// store with one seeded from the reloaded document.
    pub async fn store(&self) -> Option<DocumentStore> {
        self.current().await.artifact.store().cloned()
    }

    pub fn strategy(&self) -> BindingStrategy {
        self.binder.strategy()
    }

    /// Get configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn current(&self) -> Arc<EngineState> {
        Arc::clone(&*self.state.read().await)
    }

    /// `cancel` with the configured evaluation timeout applied
    pub fn with_default_timeout(&self, cancel: Cancellation) -> Cancellation {
        match self.config.timeout() {
            Some(timeout) => cancel.with_timeout(timeout),
            None => cancel,
        }
    }

    /// Look up or build the plan for `query`
    ///
    /// A cached build runs in its own task and fills the cache even when
    /// the caller stops waiting for it; concurrent callers share one build.
    async fn plan_for(
        &self,
        state: &Arc<EngineState>,
        query: &str,
        cancel: &Cancellation,
    ) -> Result<Arc<EvaluationPlan>> {
        cancel.check(BUILD_STAGE)?;

        let Some(slot) = state.slot(query).await else {
            debug!("Plan cache full, building `{}` uncached", query);
            let plan = self
                .planner
                .build(query, &state.modules, &state.artifact, cancel)
                .await?;
            return Ok(Arc::new(plan));
        };
        if let Some(plan) = slot.get() {
            debug!("Plan cache hit for `{}`", query);
            return Ok(Arc::clone(plan));
        }

        let planner = self.planner.clone();
        let state = Arc::clone(state);
        let query = query.to_string();
        let task = tokio::spawn(async move {
            let result = slot
                .get_or_try_init(|| async {
                    planner
                        .build(&query, &state.modules, &state.artifact, &Cancellation::new())
                        .await
                        .map(Arc::new)
                })
                .await
                .map(Arc::clone);
            if result.is_err() {
                state.forget(&query, &slot).await;
            }
            result
        });

        cancel.run(BUILD_STAGE, task).await?.map_err(|e| {
            BuildError::new(
                BuildErrorKind::CompileFailure,
                format!("plan preparation aborted: {}", e),
            )
        })?
    }
}

/// Load, bind and prepare every configured query
async fn assemble(
    config: &EngineConfig,
    source: &ContentSource,
    binder: &DataBinder,
    planner: &PlanBuilder,
    generation: u64,
    cancel: &Cancellation,
) -> Result<EngineState> {
    let loaded = source.load(cancel).await?;
    let artifact = binder.bind(&loaded.config, cancel)?;

    let mut plans = HashMap::new();
    for query in &config.queries {
        let plan = planner
            .build(query, &loaded.modules, &artifact, cancel)
            .await?;
        plans.insert(query.clone(), Arc::new(OnceCell::new_with(Some(Arc::new(plan)))));
    }

    Ok(EngineState {
        generation,
        modules: loaded.modules,
        artifact,
        plans: RwLock::new(plans),
    })
}

#[cfg(test)]
mod tests {
    use crate::builder::PolicyEngineBuilder;
    use serde_json::json;

    const AUTHZ: &str = r#"package authz

import rego.v1

allow if input.payload.role == "admin"
"#;

    #[tokio::test]
    async fn test_evaluate_prepares_and_caches_plans() {
        let engine = PolicyEngineBuilder::new()
            .add_module_content("authz.rego", AUTHZ)
            .build()
            .await
            .unwrap();

        let input = json!({"payload": {"role": "admin"}});
        let first = engine.evaluate("data.authz.allow", input.clone()).await.unwrap();
        let second = engine.evaluate("data.authz.allow", input).await.unwrap();

        assert_eq!(first.decision.as_bool(), Some(true));
        assert_eq!(first.decision, second.decision);
        assert_eq!(first.generation, 1);

        let cancel = regent_core::Cancellation::new();
        let a = engine.plan("data.authz.allow", &cancel).await.unwrap();
        let b = engine.plan("data.authz.allow", &cancel).await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_duplicate_module_ids_are_rejected() {
        let result = PolicyEngineBuilder::new()
            .add_module_content("authz.rego", AUTHZ)
            .add_module_content("authz.rego", AUTHZ)
            .build()
            .await;

        assert!(matches!(result, Err(regent_core::RegentError::Config(_))));
    }
}
