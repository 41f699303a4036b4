//! Shared fixtures for the SDK integration tests

#![allow(dead_code)]

use regent_sdk::{BindingStrategy, PolicyEngine, PolicyEngineBuilder};
use serde_json::{json, Value};

/// Reads the configuration document from `data.config`
pub const DATA_RULES: &str = r#"package authz

import rego.v1

default allow := false

allow if input.payload.role in data.config.admin_roles

limit := data.config.limits[input.payload.tier]

greeting := sprintf("%s, %s!", [data.config.messages.greeting, input.payload.name])

settings := data.config
"#;

/// Same decisions, reading the configuration document from `input.config`
pub const ENVELOPE_RULES: &str = r#"package authz

import rego.v1

default allow := false

allow if input.payload.role in input.config.admin_roles

limit := input.config.limits[input.payload.tier]

greeting := sprintf("%s, %s!", [input.config.messages.greeting, input.payload.name])

settings := input.config
"#;

/// The admin-only rule with no default
pub const ADMIN_ONLY: &str = r#"package authz

import rego.v1

allow if input.payload.role == "admin"
"#;

pub fn document() -> Value {
    json!({
        "admin_roles": ["admin", "root"],
        "limits": {"free": 10, "pro": 1000},
        "messages": {
            "greeting": "Hello",
            "quoted": "say \"hi\"",
            "path": "C:\\policies\\new",
            "multiline": "line one\nline two\ttabbed"
        },
        "nested": {"a": {"b": [1, -2, {"c": null}]}, "flag": true},
        "empty_list": [],
        "empty_map": {}
    })
}

/// Rule set matching the strategy
pub fn rules_for(strategy: BindingStrategy) -> &'static str {
    match strategy {
        BindingStrategy::InputNamespace => ENVELOPE_RULES,
        _ => DATA_RULES,
    }
}

/// Input as the caller passes it for the strategy
///
/// Rules read the caller's fields under `input.payload`; the envelope
/// strategy puts them there itself.
pub fn input_for(strategy: BindingStrategy, payload: Value) -> Value {
    match strategy {
        BindingStrategy::InputNamespace => payload,
        _ => json!({"payload": payload}),
    }
}

pub async fn engine_for(strategy: BindingStrategy) -> PolicyEngine {
    PolicyEngineBuilder::new()
        .with_strategy(strategy)
        .add_module_content("authz.rego", rules_for(strategy))
        .with_config_document(document())
        .add_query("data.authz.allow")
        .build()
        .await
        .unwrap()
}
