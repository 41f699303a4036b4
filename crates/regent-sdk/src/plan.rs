//! Evaluation plans
//!
//! [`PlanBuilder`] combines a query, the rule modules and a binding artifact
//! into an [`EvaluationPlan`] prepared once by the rule engine. A plan is
//! immutable and is executed concurrently by any number of callers.

use crate::binding::{BindingArtifact, BindingStrategy};
use regent_core::{
    BindError, BuildError, BuildErrorKind, Cancellation, Decision, EvalError, RegentError,
    RequestInput, Result, RuleModule,
};
use regent_runtime::{EngineError, PrepareRequest, PreparedQuery, ResultSet, RuleEngine};
use std::sync::Arc;
use tracing::{debug, info};

const BUILD_STAGE: &str = "build";
const EXECUTE_STAGE: &str = "execute";

/// Prepares evaluation plans on a rule engine
#[derive(Clone)]
pub struct PlanBuilder {
    engine: Arc<dyn RuleEngine>,
}

impl PlanBuilder {
    pub fn new(engine: Arc<dyn RuleEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<dyn RuleEngine> {
        &self.engine
    }

    /// Prepare `query` over `modules` with the configuration bound by
    /// `artifact`
    ///
    /// Preparation runs on the blocking pool. Nothing is returned unless
    /// every module compiled and the query parsed.
    pub async fn build(
        &self,
        query: &str,
        modules: &[RuleModule],
        artifact: &BindingArtifact,
        cancel: &Cancellation,
    ) -> Result<EvaluationPlan> {
        cancel.check(BUILD_STAGE)?;

        let mut all_modules = modules.to_vec();
        if let Some(generated) = artifact.extra_module() {
            if all_modules.iter().any(|m| m.id == generated.id) {
                return Err(BuildError::new(
                    BuildErrorKind::CompileFailure,
                    format!("module id {} is reserved for generated rules", generated.id),
                )
                .into());
            }
            all_modules.push(generated.clone());
        }

        let request = PrepareRequest::new(query)
            .with_modules(all_modules.clone())
            .with_data(artifact.data_source());
        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || engine.prepare(request));

        let prepared = cancel
            .run(BUILD_STAGE, task)
            .await?
            .map_err(|e| {
                BuildError::new(
                    BuildErrorKind::CompileFailure,
                    format!("plan preparation aborted: {}", e),
                )
            })?
            .map_err(classify_build_error)?;

        info!(
            "Prepared plan for `{}` on {} ({} modules, {} binding)",
            query,
            self.engine.name(),
            all_modules.len(),
            artifact.strategy()
        );

        Ok(EvaluationPlan {
            query: query.to_string(),
            modules: all_modules,
            artifact: Arc::new(artifact.clone()),
            prepared,
        })
    }
}

fn classify_build_error(err: EngineError) -> RegentError {
    match err {
        EngineError::QuerySyntax(detail) => {
            BuildError::new(BuildErrorKind::QuerySyntaxError, detail).into()
        }
        EngineError::Compile(detail) | EngineError::Runtime(detail) => {
            BuildError::new(BuildErrorKind::CompileFailure, detail).into()
        }
        EngineError::Data(detail) => BindError::serialization(detail).into(),
    }
}

/// A prepared, reusable query with its modules and bound configuration
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    query: String,
    modules: Vec<RuleModule>,
    artifact: Arc<BindingArtifact>,
    prepared: Arc<dyn PreparedQuery>,
}

impl EvaluationPlan {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Modules the plan was built from, including any generated module
    pub fn modules(&self) -> &[RuleModule] {
        &self.modules
    }

    pub fn strategy(&self) -> BindingStrategy {
        self.artifact.strategy()
    }

    pub fn artifact(&self) -> &BindingArtifact {
        &self.artifact
    }

    /// Execute on the blocking pool, honouring `cancel`
    ///
    /// A cancelled call returns [`RegentError::Cancelled`]; the engine work
    /// already started finishes in the background and its result is
    /// discarded.
    pub async fn execute(&self, input: RequestInput, cancel: &Cancellation) -> Result<Decision> {
        cancel.check(EXECUTE_STAGE)?;

        let prepared = Arc::clone(&self.prepared);
        let artifact = Arc::clone(&self.artifact);
        let task =
            tokio::task::spawn_blocking(move || evaluate(prepared.as_ref(), &artifact, input));

        cancel
            .run(EXECUTE_STAGE, task)
            .await?
            .map_err(|e| EvalError::runtime(format!("evaluation aborted: {}", e)))?
    }

    /// Execute on the current thread
    pub fn execute_blocking(&self, input: RequestInput) -> Result<Decision> {
        evaluate(self.prepared.as_ref(), &self.artifact, input)
    }
}

fn evaluate(
    prepared: &dyn PreparedQuery,
    artifact: &BindingArtifact,
    input: RequestInput,
) -> Result<Decision> {
    let input = artifact.prepare_input(input);
    let sets = prepared
        .eval(Some(&input))
        .map_err(|e| EvalError::runtime(e.to_string()))?;
    let decision = extract_decision(sets)?;
    debug!("Evaluated `{}`", prepared.query());
    Ok(decision)
}

/// The first expression value of the first result set
fn extract_decision(sets: Vec<ResultSet>) -> Result<Decision> {
    let first = sets
        .into_iter()
        .next()
        .ok_or_else(|| EvalError::no_result("query produced no results"))?;
    let expression = first
        .expressions
        .into_iter()
        .next()
        .ok_or_else(|| EvalError::no_result("result has no expressions"))?;
    Ok(Decision::new(expression.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{DataBinder, DataNamespace};
    use regent_core::{BindErrorKind, ConfigDocument, EvalErrorKind, Value};
    use regent_runtime::ExpressionValue;
    use serde_json::json;
    use std::sync::Mutex;

    /// Engine double that records requests and replays canned outcomes
    #[derive(Default)]
    struct ScriptedEngine {
        prepare_error: Option<EngineError>,
        sets: Vec<ResultSet>,
        eval_error: Option<EngineError>,
        requests: Mutex<Vec<PrepareRequest>>,
        prepared: Mutex<Vec<Arc<ScriptedQuery>>>,
    }

    #[derive(Debug)]
    struct ScriptedQuery {
        query: String,
        sets: Vec<ResultSet>,
        eval_error: Option<EngineError>,
        inputs: Mutex<Vec<Value>>,
    }

    impl RuleEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn prepare(
            &self,
            request: PrepareRequest,
        ) -> regent_runtime::Result<Arc<dyn PreparedQuery>> {
            if let Some(err) = &self.prepare_error {
                return Err(err.clone());
            }
            let query = Arc::new(ScriptedQuery {
                query: request.query.clone(),
                sets: self.sets.clone(),
                eval_error: self.eval_error.clone(),
                inputs: Mutex::new(Vec::new()),
            });
            self.requests.lock().unwrap().push(request);
            self.prepared.lock().unwrap().push(Arc::clone(&query));
            Ok(query as Arc<dyn PreparedQuery>)
        }
    }

    impl PreparedQuery for ScriptedQuery {
        fn query(&self) -> &str {
            &self.query
        }

        fn eval(&self, input: Option<&Value>) -> regent_runtime::Result<Vec<ResultSet>> {
            if let Some(input) = input {
                self.inputs.lock().unwrap().push(input.clone());
            }
            match &self.eval_error {
                Some(err) => Err(err.clone()),
                None => Ok(self.sets.clone()),
            }
        }
    }

    fn result(values: &[Value]) -> ResultSet {
        ResultSet {
            expressions: values
                .iter()
                .map(|value| ExpressionValue {
                    text: "q".to_string(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    fn artifact(strategy: BindingStrategy) -> BindingArtifact {
        DataBinder::new(strategy, DataNamespace::parse("config").unwrap())
            .bind(
                &ConfigDocument::from_value(json!({"max": 3})).unwrap(),
                &Cancellation::new(),
            )
            .unwrap()
    }

    async fn build(engine: ScriptedEngine, strategy: BindingStrategy) -> Result<EvaluationPlan> {
        PlanBuilder::new(Arc::new(engine))
            .build(
                "data.q",
                &[RuleModule::new("q.rego", "package q")],
                &artifact(strategy),
                &Cancellation::new(),
            )
            .await
    }

    #[tokio::test]
    async fn test_first_expression_of_first_result_is_the_decision() {
        let engine = ScriptedEngine {
            sets: vec![result(&[json!("first"), json!("x")]), result(&[json!("second")])],
            ..Default::default()
        };
        let plan = build(engine, BindingStrategy::ParsedValue).await.unwrap();

        let decision = plan
            .execute(RequestInput::default(), &Cancellation::new())
            .await
            .unwrap();

        assert_eq!(decision.value(), &json!("first"));
    }

    #[tokio::test]
    async fn test_no_result_sets_is_no_result() {
        let plan = build(ScriptedEngine::default(), BindingStrategy::ParsedValue)
            .await
            .unwrap();

        let err = plan
            .execute(RequestInput::default(), &Cancellation::new())
            .await
            .unwrap_err();

        assert!(err.is_no_result());
    }

    #[tokio::test]
    async fn test_empty_expressions_is_no_result() {
        let engine = ScriptedEngine {
            sets: vec![result(&[])],
            ..Default::default()
        };
        let plan = build(engine, BindingStrategy::ParsedValue).await.unwrap();

        assert!(plan
            .execute_blocking(RequestInput::default())
            .unwrap_err()
            .is_no_result());
    }

    #[tokio::test]
    async fn test_engine_failure_is_runtime_failure() {
        let engine = ScriptedEngine {
            eval_error: Some(EngineError::Runtime("division by zero".to_string())),
            ..Default::default()
        };
        let plan = build(engine, BindingStrategy::ParsedValue).await.unwrap();

        match plan.execute_blocking(RequestInput::default()).unwrap_err() {
            RegentError::Eval(e) => {
                assert_eq!(e.kind, EvalErrorKind::RuntimeFailure);
                assert!(e.detail.contains("division by zero"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prepare_errors_are_classified() {
        let cases = [
            (
                EngineError::QuerySyntax("bad".to_string()),
                "query syntax error",
            ),
            (EngineError::Compile("bad".to_string()), "compile failure"),
            (EngineError::Runtime("bad".to_string()), "compile failure"),
        ];
        for (engine_error, kind) in cases {
            let engine = ScriptedEngine {
                prepare_error: Some(engine_error),
                ..Default::default()
            };
            match build(engine, BindingStrategy::ParsedValue).await.unwrap_err() {
                RegentError::Build(e) => assert_eq!(e.kind.to_string(), kind),
                other => panic!("unexpected error {:?}", other),
            }
        }

        let engine = ScriptedEngine {
            prepare_error: Some(EngineError::Data("bad".to_string())),
            ..Default::default()
        };
        match build(engine, BindingStrategy::ParsedValue).await.unwrap_err() {
            RegentError::Bind(e) => assert_eq!(e.kind, BindErrorKind::SerializationFailure),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_synthetic_module_is_compiled_with_bundle_modules() {
        let engine = Arc::new(ScriptedEngine::default());
        let plan = PlanBuilder::new(engine.clone())
            .build(
                "data.q",
                &[RuleModule::new("q.rego", "package q")],
                &artifact(BindingStrategy::SyntheticModule),
                &Cancellation::new(),
            )
            .await
            .unwrap();

        let ids: Vec<_> = plan.modules().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["q.rego", "__synthetic__/config.rego"]);

        let requests = engine.requests.lock().unwrap();
        assert_eq!(requests[0].modules.len(), 2);
    }

    #[tokio::test]
    async fn test_input_namespace_wraps_input() {
        let engine = Arc::new(ScriptedEngine {
            sets: vec![result(&[json!(true)])],
            ..Default::default()
        });
        let plan = PlanBuilder::new(engine.clone())
            .build(
                "data.q",
                &[],
                &artifact(BindingStrategy::InputNamespace),
                &Cancellation::new(),
            )
            .await
            .unwrap();

        plan.execute_blocking(RequestInput::new(json!({"role": "admin"})))
            .unwrap();

        let prepared = engine.prepared.lock().unwrap();
        let inputs = prepared[0].inputs.lock().unwrap();
        assert_eq!(
            inputs[0],
            json!({"config": {"max": 3}, "payload": {"role": "admin"}})
        );
        assert!(matches!(
            engine.requests.lock().unwrap()[0].data,
            regent_runtime::DataSource::None
        ));
    }

    #[tokio::test]
    async fn test_cancelled_build_returns_no_plan() {
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = PlanBuilder::new(Arc::new(ScriptedEngine::default()))
            .build(
                "data.q",
                &[],
                &artifact(BindingStrategy::ParsedValue),
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }
}
