//! Bidirectional conversion between nested documents and flat dotted maps.
//!
//! Flattening walks a JSON-like document and records every leaf under its
//! dot-joined path. Three node shapes are distinguished by the pure
//! [`classify`] predicate:
//!
//! - **parameter definitions**: mappings carrying `name`, `help` and
//!   `required` (plus `default` in config documents); recorded under
//!   `parent.name` without descending further,
//! - **values**: scalars, empty mappings and *opaque* lists (lists with no
//!   parameter definitions anywhere inside); recorded as single leaves,
//! - **parents**: other mappings (one path segment per key) and lists that
//!   do contain definitions (every element shares the list's path).
//!
//! Expansion is the inverse: config maps become nested mappings, spec maps
//! become lists whose entries are definitions or trailing `key → list`
//! mappings.
//!
//! # Example
//!
//! ```
//! use paramspec_core::{DocumentKind, expand, flatten};
//! use serde_json::json;
//!
//! let config = json!({
//!     "lr": 0.1,
//!     "model": {"depth": 4, "widths": [8, 16]},
//! });
//! let flat = flatten(&config, DocumentKind::Config).unwrap();
//! assert_eq!(flat["model.depth"], json!(4));
//! assert_eq!(flat["model.widths"], json!([8, 16]));
//!
//! let nested = expand(&flat, DocumentKind::Config).unwrap();
//! assert_eq!(nested, config);
//! ```

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::parameter::{kind_of, render};

/// Ordered map of dotted keys to leaf values.
pub type FlatMap = Map<String, Value>;

/// Key separator for flat paths.
pub const SEPARATOR: char = '.';

/// Which reading of a document is intended.
///
/// Spec documents hold parameter definitions and expand into lists; config
/// documents hold plain values and expand into mappings. A config document
/// only treats a mapping as a parameter definition when it also carries a
/// `default` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    #[default]
    Spec,
    Config,
}

impl DocumentKind {
    fn definition_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Spec => &["name", "help", "required"],
            Self::Config => &["name", "help", "required", "default"],
        }
    }
}

/// Shape of a document node as seen by the flattening walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A mapping describing a parameter.
    ParameterDefinition,
    /// A leaf recorded as-is.
    Value,
    /// Structure to descend into.
    Parent,
}

/// Returns `true` if `node` itself describes a parameter.
///
/// # Examples
///
/// ```
/// use paramspec_core::{DocumentKind, is_parameter_definition};
/// use serde_json::json;
///
/// let def = json!({"name": "lr", "help": "", "required": true});
/// assert!(is_parameter_definition(&def, DocumentKind::Spec));
/// assert!(!is_parameter_definition(&def, DocumentKind::Config));
/// assert!(!is_parameter_definition(&json!({"lr": 0.1}), DocumentKind::Spec));
/// ```
pub fn is_parameter_definition(node: &Value, kind: DocumentKind) -> bool {
    node.as_object().is_some_and(|map| {
        kind.definition_keys()
            .iter()
            .all(|key| map.contains_key(*key))
    })
}

/// Returns `true` if `node` is, or anywhere contains, a parameter definition.
pub fn contains_parameter_definition(node: &Value, kind: DocumentKind) -> bool {
    if is_parameter_definition(node, kind) {
        return true;
    }
    match node {
        Value::Object(map) => map
            .values()
            .any(|child| contains_parameter_definition(child, kind)),
        Value::Array(items) => items
            .iter()
            .any(|child| contains_parameter_definition(child, kind)),
        _ => false,
    }
}

/// Classifies a node for the flattening walk.
///
/// # Examples
///
/// ```
/// use paramspec_core::{DocumentKind, NodeKind, classify};
/// use serde_json::json;
///
/// let kind = DocumentKind::Config;
/// assert_eq!(classify(&json!(3), kind), NodeKind::Value);
/// assert_eq!(classify(&json!([{"op": "flip"}]), kind), NodeKind::Value);
/// assert_eq!(classify(&json!({"a": 1}), kind), NodeKind::Parent);
/// ```
pub fn classify(node: &Value, kind: DocumentKind) -> NodeKind {
    if is_parameter_definition(node, kind) {
        return NodeKind::ParameterDefinition;
    }
    match node {
        Value::Object(map) if map.is_empty() => NodeKind::Value,
        Value::Object(_) => NodeKind::Parent,
        Value::Array(items) => {
            if items
                .iter()
                .any(|item| contains_parameter_definition(item, kind))
            {
                NodeKind::Parent
            } else {
                NodeKind::Value
            }
        }
        _ => NodeKind::Value,
    }
}

/// Flattens a nested document into dotted keys, preserving source order.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDocumentRoot`] when the root (or a bare
/// root-level list element) is a value with no key to record it under.
pub fn flatten(document: &Value, kind: DocumentKind) -> Result<FlatMap> {
    let mut flat = FlatMap::new();
    walk(document, None, kind, &mut flat)?;
    Ok(flat)
}

fn walk(node: &Value, parent: Option<&str>, kind: DocumentKind, flat: &mut FlatMap) -> Result<()> {
    match classify(node, kind) {
        NodeKind::ParameterDefinition => {
            let name = node.get("name").map(render).unwrap_or_default();
            record(flat, join(parent, &name), node);
        }
        NodeKind::Value => match parent {
            Some(key) => record(flat, key.to_string(), node),
            None if is_empty_container(node) => {}
            None => return Err(ConfigError::InvalidDocumentRoot(kind_of(node))),
        },
        NodeKind::Parent => match node {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = join(parent, key);
                    walk(child, Some(&path), kind, flat)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, parent, kind, flat)?;
                }
            }
            _ => {}
        },
    }
    Ok(())
}

fn record(flat: &mut FlatMap, key: String, value: &Value) {
    if flat.contains_key(&key) {
        warn!(key = %key, "duplicate flat key while flattening; later value wins");
    }
    flat.insert(key, value.clone());
}

fn join(parent: Option<&str>, segment: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}{SEPARATOR}{segment}"),
        None => segment.to_string(),
    }
}

fn is_empty_container(node: &Value) -> bool {
    match node {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Rebuilds a nested document from a flat map.
///
/// In [`DocumentKind::Config`] mode every segment becomes a mapping level and
/// the result is a mapping. In [`DocumentKind::Spec`] mode the last segment
/// is the parameter's own name, each earlier segment becomes a `key → list`
/// entry, and the result is a list.
///
/// Spec mode gathers group entries into one trailing mapping per list, so
/// `expand(flatten(doc))` reproduces `doc` only when `doc` is in that shape.
/// Sibling group mappings such as `[def, {"g": [..]}, {"h": [..]}]` come
/// back merged as `[def, {"g": [..], "h": [..]}]`; the flat form is the same.
///
/// # Errors
///
/// Returns [`ConfigError::PathCollision`] when a dotted key descends through
/// a path that already holds a value (or a value would replace a subtree).
///
/// # Examples
///
/// ```
/// use paramspec_core::{DocumentKind, FlatMap, expand};
/// use serde_json::json;
///
/// let def = |name: &str| json!({"name": name, "help": "", "required": true});
/// let mut flat = FlatMap::new();
/// flat.insert("a".into(), def("a"));
/// flat.insert("group.b".into(), def("b"));
///
/// let spec = expand(&flat, DocumentKind::Spec).unwrap();
/// assert_eq!(spec, json!([def("a"), {"group": [def("b")]}]));
/// ```
pub fn expand(flat: &FlatMap, kind: DocumentKind) -> Result<Value> {
    match kind {
        DocumentKind::Config => {
            let mut root = Map::new();
            for (key, value) in flat {
                let segments: Vec<&str> = key.split(SEPARATOR).collect();
                assign_nested(&mut root, &segments, value, key)?;
            }
            Ok(Value::Object(root))
        }
        DocumentKind::Spec => {
            let mut root = Vec::new();
            for (key, value) in flat {
                let segments: Vec<&str> = key.split(SEPARATOR).collect();
                let parents = &segments[..segments.len().saturating_sub(1)];
                append_nested(&mut root, parents, value, key)?;
            }
            Ok(Value::Array(root))
        }
    }
}

fn assign_nested(
    current: &mut Map<String, Value>,
    segments: &[&str],
    value: &Value,
    key: &str,
) -> Result<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        if current.contains_key(*head) {
            return Err(ConfigError::PathCollision(key.to_string()));
        }
        current.insert(head.to_string(), value.clone());
        return Ok(());
    }
    let entry = current
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    match entry {
        Value::Object(child) => assign_nested(child, rest, value, key),
        _ => Err(ConfigError::PathCollision(key.to_string())),
    }
}

fn append_nested(list: &mut Vec<Value>, parents: &[&str], value: &Value, key: &str) -> Result<()> {
    let Some((head, rest)) = parents.split_first() else {
        list.push(value.clone());
        return Ok(());
    };
    let reuse_trailing = matches!(
        list.last(),
        Some(last) if last.is_object() && !is_parameter_definition(last, DocumentKind::Spec)
    );
    if !reuse_trailing {
        list.push(Value::Object(Map::new()));
    }
    let Some(Value::Object(mapping)) = list.last_mut() else {
        return Err(ConfigError::PathCollision(key.to_string()));
    };
    let entry = mapping
        .entry(head.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match entry {
        Value::Array(children) => append_nested(children, rest, value, key),
        _ => Err(ConfigError::PathCollision(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn def(name: &str) -> Value {
        json!({"name": name, "help": "h", "required": true, "parameter_type": "int", "default": 1})
    }

    #[test]
    fn test_classify_distinguishes_shapes() {
        let spec = DocumentKind::Spec;
        assert_eq!(classify(&def("a"), spec), NodeKind::ParameterDefinition);
        assert_eq!(classify(&json!("x"), spec), NodeKind::Value);
        assert_eq!(classify(&json!([1, 2]), spec), NodeKind::Value);
        assert_eq!(classify(&json!({}), spec), NodeKind::Value);
        assert_eq!(classify(&json!([def("a")]), spec), NodeKind::Parent);
        assert_eq!(classify(&json!([{"g": [def("a")]}]), spec), NodeKind::Parent);
        assert_eq!(classify(&json!({"g": 1}), spec), NodeKind::Parent);
    }

    #[test]
    fn test_config_kind_requires_default_key() {
        let partial = json!({"name": "a", "help": "h", "required": true});
        assert_eq!(classify(&partial, DocumentKind::Config), NodeKind::Parent);
        assert_eq!(
            classify(&def("a"), DocumentKind::Config),
            NodeKind::ParameterDefinition
        );
    }

    #[test]
    fn test_contains_parameter_definition_is_recursive() {
        let kind = DocumentKind::Spec;
        assert!(contains_parameter_definition(&json!({"a": {"b": [def("c")]}}), kind));
        assert!(!contains_parameter_definition(&json!({"a": {"b": [1]}}), kind));
        assert!(!is_parameter_definition(&json!({"a": [def("c")]}), kind));
    }

    #[test]
    fn test_flatten_spec_document() {
        let doc = json!([def("a"), def("b"), {"nested": [def("c"), {"deeper": [def("d")]}]}]);
        let flat = flatten(&doc, DocumentKind::Spec).unwrap();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "nested.c", "nested.deeper.d"]);
        assert_eq!(flat["nested.c"], def("c"));
    }

    #[test]
    fn test_flatten_keeps_opaque_lists_of_mappings_whole() {
        let doc = json!({
            "augment": [{"op": "flip", "p": 0.5}, {"op": "crop", "size": 32}],
            "sizes": [1, 2, 3]
        });
        let flat = flatten(&doc, DocumentKind::Config).unwrap();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["augment"], doc["augment"]);
        assert_eq!(flat["sizes"], json!([1, 2, 3]));
    }

    #[test]
    fn test_flatten_preserves_source_order() {
        let doc = json!({"z": 1, "a": {"y": 2, "b": 3}, "m": 4});
        let flat = flatten(&doc, DocumentKind::Config).unwrap();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a.y", "a.b", "m"]);
    }

    #[test]
    fn test_flatten_rejects_scalar_root() {
        assert!(matches!(
            flatten(&json!(3), DocumentKind::Config),
            Err(ConfigError::InvalidDocumentRoot("int"))
        ));
        assert!(flatten(&json!({}), DocumentKind::Config).unwrap().is_empty());
        assert!(flatten(&json!([]), DocumentKind::Spec).unwrap().is_empty());
    }

    #[test]
    fn test_config_round_trip() {
        let doc = json!({
            "A": 1,
            "B": "Btest",
            "C": [3, 4, 5],
            "nested": {"AA": 11, "deeper": {"flag": true, "kwargs": [{"k": "v"}]}},
            "empty": {},
            "none": null
        });
        let flat = flatten(&doc, DocumentKind::Config).unwrap();
        assert_eq!(expand(&flat, DocumentKind::Config).unwrap(), doc);
    }

    #[test]
    fn test_spec_round_trip() {
        let doc = json!([
            def("a"),
            {"group": [def("b"), def("c"), {"inner": [def("d")]}]},
            def("e"),
            {"other": [def("f")]}
        ]);
        let flat = flatten(&doc, DocumentKind::Spec).unwrap();
        assert_eq!(expand(&flat, DocumentKind::Spec).unwrap(), doc);
    }

    #[test]
    fn test_spec_sibling_groups_merge_into_one_mapping() {
        let doc = json!([def("a"), {"g": [def("b")]}, {"h": [def("c")]}]);
        let flat = flatten(&doc, DocumentKind::Spec).unwrap();
        let expanded = expand(&flat, DocumentKind::Spec).unwrap();
        assert_eq!(expanded, json!([def("a"), {"g": [def("b")], "h": [def("c")]}]));
        assert_eq!(flatten(&expanded, DocumentKind::Spec).unwrap(), flat);
    }

    #[test]
    fn test_expand_config_collision_is_an_error() {
        let mut flat = FlatMap::new();
        flat.insert("a".into(), json!(1));
        flat.insert("a.b".into(), json!(2));
        assert!(matches!(
            expand(&flat, DocumentKind::Config),
            Err(ConfigError::PathCollision(key)) if key == "a.b"
        ));

        let mut flat = FlatMap::new();
        flat.insert("a.b".into(), json!(2));
        flat.insert("a".into(), json!(1));
        assert!(matches!(
            expand(&flat, DocumentKind::Config),
            Err(ConfigError::PathCollision(key)) if key == "a"
        ));
    }

    #[test]
    fn test_duplicate_keys_later_value_wins() {
        let doc = json!([def("a"), {"x": 1, "name": "a", "help": "h", "required": false}]);
        let flat = flatten(&doc, DocumentKind::Spec).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a"]["required"], json!(false));
    }
}
