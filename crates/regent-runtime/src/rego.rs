//! Rego engine adapter backed by `regorus`
//!
//! Preparation registers modules and static data on a private
//! `regorus::Engine`, checks the query, and warms the engine up with one
//! evaluation so compile errors surface before the plan is handed out.
//! Each evaluation runs on a clone of the prepared engine; the prepared
//! engine itself is never evaluated against caller input. Clones are taken
//! from a small set of template shards so concurrent callers rarely wait on
//! the same lock.

use crate::engine::{
    DataSource, ExpressionValue, PrepareRequest, PreparedQuery, ResultSet, RuleEngine,
};
use crate::error::{EngineError, Result};
use crate::store::DocumentStore;
use regent_core::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use tracing::debug;

const CHECK_PACKAGE: &str = "regent_query_check";

/// Upper bound on template copies kept per prepared query
const MAX_TEMPLATE_SHARDS: usize = 8;

/// [`RuleEngine`] implementation on top of `regorus`
#[derive(Debug, Clone, Default)]
pub struct RegoEngine;

impl RegoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RuleEngine for RegoEngine {
    fn name(&self) -> &str {
        "regorus"
    }

    fn prepare(&self, request: PrepareRequest) -> Result<Arc<dyn PreparedQuery>> {
        Ok(Arc::new(RegoQuery::prepare(request)?))
    }
}

impl RegoQuery {
    fn prepare(request: PrepareRequest) -> Result<Self> {
        let PrepareRequest {
            query,
            modules,
            data,
        } = request;

        check_query_syntax(&query)?;

        let mut engine = regorus::Engine::new();
        for module in &modules {
            engine
                .add_policy(module.id.clone(), module.source.clone())
                .map_err(|e| {
                    EngineError::Compile(format!("{}: {}", module.id, chain(&e)))
                })?;
        }

        let store = match data {
            DataSource::None => None,
            DataSource::Value(value) => {
                engine
                    .add_data(to_rego(&value)?)
                    .map_err(|e| EngineError::Data(chain(&e)))?;
                None
            }
            DataSource::Store(store) => Some(store),
        };

        let shards = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, MAX_TEMPLATE_SHARDS);
        let prepared = RegoQuery {
            templates: (0..shards).map(|_| Mutex::new(engine.clone())).collect(),
            next: AtomicUsize::new(0),
            query,
            store,
        };

        // Warm-up: forces rule analysis so module errors surface here
        prepared
            .instance()?
            .eval_query(prepared.query.clone(), false)
            .map_err(|e| EngineError::Compile(chain(&e)))?;

        debug!(
            "Prepared query `{}` over {} modules",
            prepared.query,
            modules.len()
        );

        Ok(prepared)
    }

    /// Fresh engine instance holding modules, static data and store data
    fn instance(&self) -> Result<regorus::Engine> {
        let mut engine = self.template_clone()?;

        if let Some(store) = &self.store {
            let snapshot = store
                .snapshot()
                .map_err(|e| EngineError::Data(e.to_string()))?;
            engine
                .add_data(to_rego(&snapshot.root)?)
                .map_err(|e| EngineError::Data(chain(&e)))?;
        }

        Ok(engine)
    }

    /// Clone the first free template shard, starting at a rotating offset
    fn template_clone(&self) -> Result<regorus::Engine> {
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        let count = self.templates.len();
        for offset in 0..count {
            match self.templates[(start + offset) % count].try_lock() {
                Ok(template) => return Ok(template.clone()),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
            }
        }
        self.templates[start % count]
            .lock()
            .map(|template| template.clone())
            .map_err(|_| poisoned())
    }
}

fn poisoned() -> EngineError {
    EngineError::Runtime("prepared engine lock poisoned".to_string())
}

/// A query prepared on a `regorus` engine
struct RegoQuery {
    /// Identical engines with modules and static data registered
    templates: Vec<Mutex<regorus::Engine>>,
    next: AtomicUsize,
    query: String,
    /// Backing store read at the start of every evaluation
    store: Option<DocumentStore>,
}

impl fmt::Debug for RegoQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegoQuery")
            .field("query", &self.query)
            .field("templates", &self.templates.len())
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl PreparedQuery for RegoQuery {
    fn query(&self) -> &str {
        &self.query
    }

    fn eval(&self, input: Option<&Value>) -> Result<Vec<ResultSet>> {
        let mut engine = self.instance()?;
        if let Some(input) = input {
            engine.set_input(to_rego(input)?);
        }

        let results = engine
            .eval_query(self.query.clone(), false)
            .map_err(|e| EngineError::Runtime(chain(&e)))?;

        let mut sets = Vec::with_capacity(results.result.len());
        for result in results.result {
            if result
                .expressions
                .iter()
                .any(|expr| matches!(expr.value, regorus::Value::Undefined))
            {
                continue;
            }
            let mut expressions = Vec::with_capacity(result.expressions.len());
            for expr in result.expressions {
                expressions.push(ExpressionValue {
                    text: expr.text.to_string(),
                    value: from_rego(&expr.value)?,
                });
            }
            sets.push(ResultSet { expressions });
        }
        Ok(sets)
    }
}

/// Reject queries that do not parse as a rule body
///
/// Brackets must balance on their own, so the query cannot close the check
/// rule it is embedded in. The check module is parsed on a throwaway engine.
fn check_query_syntax(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(EngineError::QuerySyntax("query is empty".to_string()));
    }
    check_brackets(query)?;

    let module = format!(
        "package {}\n\nimport rego.v1\n\nquery_body if {{\n{}\n}}\n",
        CHECK_PACKAGE, query
    );
    regorus::Engine::new()
        .add_policy(format!("{}.rego", CHECK_PACKAGE), module)
        .map(|_| ())
        .map_err(|e| EngineError::QuerySyntax(chain(&e)))
}

/// Bracket nesting outside string literals and comments
fn check_brackets(query: &str) -> Result<()> {
    let syntax = EngineError::QuerySyntax;
    let mut open = Vec::new();
    let mut chars = query.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => loop {
                match chars.next() {
                    Some('\\') => {
                        chars.next();
                    }
                    Some('"') => break,
                    Some('\n') | None => {
                        return Err(syntax("unterminated string literal".to_string()))
                    }
                    Some(_) => {}
                }
            },
            '`' => {
                if !chars.by_ref().any(|c| c == '`') {
                    return Err(syntax("unterminated raw string literal".to_string()));
                }
            }
            '#' => {
                chars.by_ref().find(|&c| c == '\n');
            }
            '(' | '[' | '{' => open.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.pop() != Some(expected) {
                    return Err(syntax(format!("unbalanced `{}`", c)));
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(c) => Err(syntax(format!("unclosed `{}`", c))),
        None => Ok(()),
    }
}

/// Render an engine error with its full cause chain
fn chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

/// Convert a JSON value into the engine's value representation
pub fn to_rego(value: &Value) -> Result<regorus::Value> {
    let text = serde_json::to_string(value).map_err(|e| EngineError::Data(e.to_string()))?;
    regorus::Value::from_json_str(&text).map_err(|e| EngineError::Data(chain(&e)))
}

/// Convert an engine value back into JSON; sets become arrays
pub fn from_rego(value: &regorus::Value) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| EngineError::Data(e.to_string()))
}
