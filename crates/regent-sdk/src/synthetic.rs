//! Synthetic rule module rendering
//!
//! Turns a configuration document into Rego source: one package named after
//! the data namespace, one constant rule per top-level key. Values are
//! rendered as compact JSON. Every JSON literal is also a Rego term with the
//! same value, and JSON string escapes are a subset of Rego's, so the only
//! names that need checking are the rule names themselves.
//!
//! ```text
//! package config
//!
//! limits := {"max_items": 5}
//! roles := ["admin", "auditor"]
//! ```

use crate::binding::DataNamespace;
use regent_core::{BindError, ConfigDocument, RuleModule, Value};

/// Identifier prefix of generated modules
pub const SYNTHETIC_MODULE_PREFIX: &str = "__synthetic__";

/// Words that cannot name a rule or a package segment
const RESERVED_WORDS: &[&str] = &[
    "as", "contains", "data", "default", "else", "every", "false", "if", "import", "in",
    "input", "not", "null", "package", "some", "true", "with",
];

/// Whether `name` can be used as a rule name or package path segment
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

/// Render `document` as a module defining `data.<namespace>`
///
/// The document must be an object and the namespace non-empty. Every
/// top-level key must be an identifier; nested keys are quoted and may be
/// anything.
pub fn render_module(
    namespace: &DataNamespace,
    document: &ConfigDocument,
) -> Result<RuleModule, BindError> {
    if namespace.is_root() {
        return Err(BindError::unsupported_shape(
            "synthetic module needs a non-empty namespace to name its package",
        ));
    }
    let Value::Object(fields) = document.as_value() else {
        return Err(BindError::unsupported_shape(
            "synthetic module needs an object configuration document",
        ));
    };

    let mut source = format!("package {}\n", namespace.dotted());
    for (key, value) in fields {
        if !is_identifier(key) {
            return Err(BindError::unsupported_shape(format!(
                "top-level key {:?} is not a valid rule name",
                key
            )));
        }
        let term = render_term(value)?;
        source.push('\n');
        source.push_str(key);
        source.push_str(" := ");
        source.push_str(&term);
        source.push('\n');
    }

    Ok(RuleModule::new(
        format!("{}/{}.rego", SYNTHETIC_MODULE_PREFIX, namespace.dotted()),
        source,
    ))
}

/// Render one value as a single-line Rego term
///
/// Compact JSON escapes every control character, so the term never spans
/// lines.
pub fn render_term(value: &Value) -> Result<String, BindError> {
    serde_json::to_string(value).map_err(|e| BindError::serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_core::BindErrorKind;
    use serde_json::json;

    fn namespace(path: &str) -> DataNamespace {
        DataNamespace::parse(path).unwrap()
    }

    fn document(value: Value) -> ConfigDocument {
        ConfigDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("max_items"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("v2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("max-items"));
        assert!(!is_identifier("default"));
        assert!(!is_identifier("input"));
    }

    #[test]
    fn test_render_module() {
        let module = render_module(
            &namespace("config"),
            &document(json!({"roles": ["admin"], "limits": {"max": 3}})),
        )
        .unwrap();

        assert_eq!(module.id, "__synthetic__/config.rego");
        assert!(module.source.starts_with("package config\n\n"));
        assert!(module.source.contains("\nlimits := {\"max\":3}\n"));
        assert!(module.source.contains("\nroles := [\"admin\"]\n"));
    }

    #[test]
    fn test_nested_namespace_package() {
        let module =
            render_module(&namespace("app.settings"), &document(json!({"a": 1}))).unwrap();
        assert!(module.source.starts_with("package app.settings\n"));
    }

    #[test]
    fn test_strings_are_escaped() {
        let term = render_term(&json!("say \"hi\"\\\n")).unwrap();
        assert_eq!(term, r#""say \"hi\"\\\n""#);
    }

    #[test]
    fn test_control_characters_stay_on_one_line() {
        let term = render_term(&json!({"a": "x\ny\r\u{1}"})).unwrap();
        assert!(!term.contains('\n'));
        assert!(!term.contains('\r'));
        assert_eq!(term, r#"{"a":"x\ny\r\u0001"}"#);
    }

    #[test]
    fn test_invalid_top_level_key_is_rejected() {
        let err = render_module(&namespace("config"), &document(json!({"max-items": 1})))
            .unwrap_err();
        assert_eq!(err.kind, BindErrorKind::UnsupportedShape);

        let err = render_module(&namespace("config"), &document(json!({"import": 1})))
            .unwrap_err();
        assert_eq!(err.kind, BindErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_nested_keys_may_be_arbitrary() {
        let module = render_module(
            &namespace("config"),
            &document(json!({"headers": {"x-request-id": "a\"b"}})),
        )
        .unwrap();
        assert!(module.source.contains(r#"headers := {"x-request-id":"a\"b"}"#));
    }

    #[test]
    fn test_array_document_is_unsupported() {
        let err = render_module(&namespace("config"), &document(json!([1, 2]))).unwrap_err();
        assert_eq!(err.kind, BindErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_root_namespace_is_unsupported() {
        let err = render_module(&namespace(""), &document(json!({"a": 1}))).unwrap_err();
        assert_eq!(err.kind, BindErrorKind::UnsupportedShape);
    }
}
