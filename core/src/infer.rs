//! Schema inference from plain values.
//!
//! When a config is loaded without a spec, every flat value gets a required
//! parameter of the matching kind with the value as its default. Numeric
//! parameters are pinned to `p1 = p2 = value`, so sampling them reproduces
//! the value.

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::parameter::{
    BoolParameter, FloatParameter, IntParameter, ListParameter, Parameter, StrParameter,
    ValueType, kind_of, render,
};
use crate::registry::SchemaRegistry;
use crate::transcode::{FlatMap, SEPARATOR};

/// Help text given to every inferred parameter.
pub const NO_HELP: &str = "(NO HELP CONFIGURED)";

/// Infers a parameter for the value stored under flat `key`.
///
/// The parameter is named after the last key segment.
///
/// # Errors
///
/// Returns [`ConfigError::CannotInfer`] for mappings and integers outside
/// the `i64` range.
///
/// # Examples
///
/// ```
/// use paramspec_core::{ParameterKind, infer_parameter};
/// use serde_json::json;
///
/// let param = infer_parameter("train.epochs", &json!(12)).unwrap();
/// assert_eq!(param.name(), "epochs");
/// assert_eq!(param.kind(), ParameterKind::Int);
/// assert_eq!(param.default_value(), json!(12));
///
/// let param = infer_parameter("tags", &json!([])).unwrap();
/// assert_eq!(param.to_dict()["value_type"], "str");
/// ```
pub fn infer_parameter(key: &str, value: &Value) -> Result<Parameter> {
    let name = key.rsplit(SEPARATOR).next().unwrap_or(key);
    let built = match value {
        Value::Bool(b) => BoolParameter::new(name, NO_HELP, true, *b).build(),
        Value::Number(n) if n.is_i64() => {
            let v = n.as_i64().unwrap_or_default();
            IntParameter::new(name, NO_HELP, true)
                .with_default(v)
                .with_bounds(v, v)
                .build()
        }
        Value::Number(n) if n.is_f64() => {
            let v = n.as_f64().unwrap_or_default();
            FloatParameter::new(name, NO_HELP, true)
                .with_default(v)
                .with_bounds(v, v)
                .build()
        }
        Value::String(s) => StrParameter::new(name, NO_HELP, true).with_default(s).build(),
        Value::Array(items) => ListParameter::new(name, NO_HELP, true, element_type(items))
            .with_default(items.clone())
            .build(),
        Value::Null => StrParameter::new(name, NO_HELP, true).build(),
        other => return Err(cannot_infer(key, other)),
    };
    built.map_err(|source| ConfigError::InvalidDefinition {
        key: key.to_string(),
        source,
    })
}

/// Infers a registry for every entry of a flat value map.
pub fn infer_registry(flat: &FlatMap) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    for (key, value) in flat {
        let parameter = infer_parameter(key, value)?;
        debug!(key = %key, kind = %parameter.kind(), "inferred parameter");
        registry.insert(key.clone(), parameter);
    }
    Ok(registry)
}

/// Element type taken from the first element; empty lists hold strings.
fn element_type(items: &[Value]) -> ValueType {
    match items.first() {
        Some(Value::Bool(_)) => ValueType::Bool,
        Some(Value::Number(n)) if n.is_f64() => ValueType::Float,
        Some(Value::Number(_)) => ValueType::Int,
        Some(Value::Object(_)) => ValueType::Dict,
        _ => ValueType::Str,
    }
}

fn cannot_infer(key: &str, value: &Value) -> ConfigError {
    ConfigError::CannotInfer {
        key: key.to_string(),
        kind: kind_of(value),
        value: render(value),
    }
}
