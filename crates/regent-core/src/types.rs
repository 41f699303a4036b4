//! Data model shared by the loader, binder, plan builder and executor

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named unit of rule-language source
///
/// The identifier is the logical path of the module inside its bundle
/// (for example `authz/rbac.rego`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleModule {
    /// Logical path, `/`-separated and relative to the bundle root
    pub id: String,

    /// Rule-language source text
    pub source: String,
}

impl RuleModule {
    /// Create a new rule module
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Static, trusted configuration data available to rules
///
/// The top level is always an object or an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigDocument(Value);

impl ConfigDocument {
    /// Wrap a parsed value, rejecting scalar top levels
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(_) | Value::Array(_) => Some(Self(value)),
            _ => None,
        }
    }

    /// An empty object document
    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-call structured input supplied by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestInput(Value);

impl RequestInput {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for RequestInput {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The value produced by one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decision(Value);

impl Decision {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Boolean view of the decision, `None` when it is not a boolean
    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_bool()
    }
}
