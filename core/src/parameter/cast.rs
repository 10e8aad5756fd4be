//! Scalar casters shared by the parameter variants.
//!
//! Each caster converts a raw [`Value`] (typically a JSON literal or a
//! command-line token) into the canonical value for one type. Failures carry
//! a short reason; [`Parameter::cast`](super::Parameter::cast) wraps them into
//! [`ParameterError::CastFailed`](crate::ParameterError::CastFailed).

use serde_json::Value;

/// Token accepted by the float and bool casters as an explicit null.
pub(crate) const NONE_TOKEN: &str = "None";

const TRUE_TOKENS: [&str; 5] = ["yes", "true", "t", "y", "1"];
const FALSE_TOKENS: [&str; 5] = ["no", "false", "f", "n", "0"];

/// Renders a value the way it appears in messages and on the command line.
///
/// Strings are rendered without quotes; everything else uses JSON text.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn to_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if n.is_u64() {
                Err("integer out of range".to_string())
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.is_finite() && f.abs() < i64::MAX as f64 {
                    Ok(Value::from(f.trunc() as i64))
                } else {
                    Err("number cannot be represented as an integer".to_string())
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|err| err.to_string()),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        other => Err(format!("expected an integer, found {}", kind_of(other))),
    }
}

pub(crate) fn to_float(value: &Value) -> Result<Value, String> {
    let f = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| "number out of range".to_string())?,
        Value::String(s) if s == NONE_TOKEN => return Ok(Value::Null),
        Value::String(s) => s.trim().parse::<f64>().map_err(|err| err.to_string())?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => return Err(format!("expected a float, found {}", kind_of(other))),
    };
    if !f.is_finite() {
        return Err("not a finite number".to_string());
    }
    Ok(Value::from(f))
}

pub(crate) fn to_bool(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) if s == NONE_TOKEN => Ok(Value::Null),
        Value::String(s) => {
            let lowered = s.trim().to_lowercase();
            if TRUE_TOKENS.contains(&lowered.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSE_TOKENS.contains(&lowered.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err("boolean value expected".to_string())
            }
        }
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        other => Err(format!("expected a boolean, found {}", kind_of(other))),
    }
}

pub(crate) fn to_str(value: &Value) -> Result<Value, String> {
    Ok(Value::String(render(value)))
}

pub(crate) fn to_dict(value: &Value) -> Result<Value, String> {
    match value {
        Value::Object(_) => Ok(value.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(&s.replace('\'', "\"")) {
            Ok(Value::Object(map)) => Ok(Value::Object(map)),
            Ok(other) => Err(format!("expected a mapping, found {}", kind_of(&other))),
            Err(err) => Err(err.to_string()),
        },
        other => Err(format!("expected a mapping, found {}", kind_of(other))),
    }
}

/// Short runtime type name used in diagnostics.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
