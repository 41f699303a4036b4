//! Data binding strategies
//!
//! A [`DataBinder`] turns the configuration document into a
//! [`BindingArtifact`] the plan builder hands to the engine. Four strategies
//! are supported and exactly one is active per engine:
//!
//! | strategy           | where rules read the document          |
//! |--------------------|----------------------------------------|
//! | `parsed_value`     | `data.<namespace>`                     |
//! | `store`            | `data.<namespace>` (backing store)     |
//! | `synthetic_module` | `data.<namespace>` (generated rules)   |
//! | `input_namespace`  | `input.config`                         |
//!
//! With `input_namespace` the caller's input moves to `input.payload`.

use crate::synthetic;
use regent_core::{
    BindError, Cancellation, ConfigDocument, RegentError, RequestInput, Result, RuleModule, Value,
};
use regent_runtime::{DataSource, DocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const STAGE: &str = "bind";

/// Envelope field holding the configuration document (`input_namespace`)
pub const ENVELOPE_CONFIG_FIELD: &str = "config";

/// Envelope field holding the caller's input (`input_namespace`)
pub const ENVELOPE_PAYLOAD_FIELD: &str = "payload";

/// How the configuration document is exposed to rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStrategy {
    /// Registered as a pre-parsed value under the data namespace
    #[default]
    ParsedValue,
    /// Held in a document store the engine reads on every evaluation
    Store,
    /// Rendered into a generated rule module
    SyntheticModule,
    /// Merged into each request's input under a reserved field
    InputNamespace,
}

impl BindingStrategy {
    pub const ALL: [BindingStrategy; 4] = [
        BindingStrategy::ParsedValue,
        BindingStrategy::Store,
        BindingStrategy::SyntheticModule,
        BindingStrategy::InputNamespace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStrategy::ParsedValue => "parsed_value",
            BindingStrategy::Store => "store",
            BindingStrategy::SyntheticModule => "synthetic_module",
            BindingStrategy::InputNamespace => "input_namespace",
        }
    }
}

impl fmt::Display for BindingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dotted path under `data` where the document is bound
///
/// The empty path is the data root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataNamespace {
    segments: Vec<String>,
}

impl DataNamespace {
    /// The data root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `config` or `app.settings`
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if let Some(bad) = segments.iter().find(|s| !synthetic::is_identifier(s)) {
            return Err(RegentError::Config(format!(
                "invalid data namespace {:?}: segment {:?} is not an identifier",
                path, bad
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path joined with dots, empty for the root
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Wrap `value` in one object per segment
    pub fn nest(&self, value: Value) -> Value {
        self.segments.iter().rev().fold(value, |inner, segment| {
            let mut map = Map::new();
            map.insert(segment.clone(), inner);
            Value::Object(map)
        })
    }
}

impl fmt::Display for DataNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("data")
        } else {
            write!(f, "data.{}", self.dotted())
        }
    }
}

/// The configuration document in the form one strategy needs
#[derive(Debug, Clone)]
pub enum BindingArtifact {
    /// Data tree merged at the engine's data root
    ParsedValue(Value),
    /// Store seeded with the document
    Store(DocumentStore),
    /// Generated module defining the document as constants
    SyntheticModule(RuleModule),
    /// Document wrapped into every input envelope
    InputNamespace(Arc<Value>),
}

impl BindingArtifact {
    pub fn strategy(&self) -> BindingStrategy {
        match self {
            BindingArtifact::ParsedValue(_) => BindingStrategy::ParsedValue,
            BindingArtifact::Store(_) => BindingStrategy::Store,
            BindingArtifact::SyntheticModule(_) => BindingStrategy::SyntheticModule,
            BindingArtifact::InputNamespace(_) => BindingStrategy::InputNamespace,
        }
    }

    /// The backing store, for `store` bindings
    pub fn store(&self) -> Option<&DocumentStore> {
        match self {
            BindingArtifact::Store(store) => Some(store),
            _ => None,
        }
    }

    /// Module to compile alongside the bundle's modules
    pub fn extra_module(&self) -> Option<&RuleModule> {
        match self {
            BindingArtifact::SyntheticModule(module) => Some(module),
            _ => None,
        }
    }

    /// Data registered with the engine at preparation time
    pub fn data_source(&self) -> DataSource {
        match self {
            BindingArtifact::ParsedValue(value) => DataSource::Value(value.clone()),
            BindingArtifact::Store(store) => DataSource::Store(store.clone()),
            BindingArtifact::SyntheticModule(_) | BindingArtifact::InputNamespace(_) => {
                DataSource::None
            }
        }
    }

    /// The engine input for one call
    pub fn prepare_input(&self, input: RequestInput) -> Value {
        match self {
            BindingArtifact::InputNamespace(config) => envelope(config, input.into_value()),
            _ => input.into_value(),
        }
    }
}

/// `{"config": <config>, "payload": <payload>}`
pub fn envelope(config: &Value, payload: Value) -> Value {
    let mut map = Map::new();
    map.insert(ENVELOPE_CONFIG_FIELD.to_string(), config.clone());
    map.insert(ENVELOPE_PAYLOAD_FIELD.to_string(), payload);
    Value::Object(map)
}

/// Binds a configuration document with one strategy
#[derive(Debug, Clone)]
pub struct DataBinder {
    strategy: BindingStrategy,
    namespace: DataNamespace,
}

impl DataBinder {
    pub fn new(strategy: BindingStrategy, namespace: DataNamespace) -> Self {
        Self {
            strategy,
            namespace,
        }
    }

    pub fn strategy(&self) -> BindingStrategy {
        self.strategy
    }

    pub fn namespace(&self) -> &DataNamespace {
        &self.namespace
    }

    /// Produce the artifact for `document`
    pub fn bind(
        &self,
        document: &ConfigDocument,
        cancel: &Cancellation,
    ) -> Result<BindingArtifact> {
        cancel.check(STAGE)?;

        let artifact = match self.strategy {
            BindingStrategy::ParsedValue => {
                self.require_object_at_root(document)?;
                BindingArtifact::ParsedValue(self.namespace.nest(document.as_value().clone()))
            }
            BindingStrategy::Store => {
                let store =
                    DocumentStore::seeded(self.namespace.segments(), document.as_value().clone())
                        .map_err(|e| BindError::unsupported_shape(e.to_string()))?;
                BindingArtifact::Store(store)
            }
            BindingStrategy::SyntheticModule => BindingArtifact::SyntheticModule(
                synthetic::render_module(&self.namespace, document)?,
            ),
            BindingStrategy::InputNamespace => {
                BindingArtifact::InputNamespace(Arc::new(document.as_value().clone()))
            }
        };

        cancel.check(STAGE)?;
        debug!(
            "Bound configuration document as {} at {}",
            self.strategy, self.namespace
        );
        Ok(artifact)
    }

    fn require_object_at_root(&self, document: &ConfigDocument) -> Result<()> {
        if self.namespace.is_root() && !document.is_object() {
            return Err(BindError::unsupported_shape(
                "only an object document can be bound at the data root",
            )
            .into());
        }
        Ok(())
    }
}
