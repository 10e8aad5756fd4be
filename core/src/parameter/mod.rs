//! Typed parameter definitions.
//!
//! A [`Parameter`] is one unit of configuration: it knows its default, how to
//! cast raw values into its type, how to sample a random value, and how to
//! describe itself as a command-line option. The set of kinds is closed; the
//! `parameter_type` tag of a definition document selects the variant in
//! exactly one place ([`ParameterKind::parse`] followed by
//! [`Parameter::from_definition`]).
//!
//! # Example
//!
//! ```
//! use paramspec_core::{Parameter, ParameterKind};
//! use serde_json::json;
//!
//! let definition = json!({
//!     "name": "n",
//!     "help": "h",
//!     "required": true,
//!     "parameter_type": "int",
//!     "default": 5,
//!     "p1": 1,
//!     "p2": 10
//! });
//! let param = Parameter::from_definition(&definition).unwrap();
//! assert_eq!(param.kind(), ParameterKind::Int);
//! assert_eq!(param.cast(&json!("7")).unwrap(), json!(7));
//! assert_eq!(param.to_dict()["parameter_type"], "int");
//! ```

mod cast;
mod decode;
mod types;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParameterError;

pub(crate) use cast::{NONE_TOKEN, kind_of, render};
pub use types::{
    BoolParameter, CategoricalParameter, FloatParameter, IntParameter, ListParameter,
    StrParameter, UNIFORM, ValueType,
};

/// Closed set of `parameter_type` tags.
///
/// # Examples
///
/// ```
/// use paramspec_core::ParameterKind;
///
/// assert_eq!(ParameterKind::parse("categorical"), Some(ParameterKind::Categorical));
/// assert_eq!(ParameterKind::Str.as_str(), "str");
/// assert!(ParameterKind::parse("enum").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
    Str,
    Categorical,
    List,
}

impl ParameterKind {
    /// Parses a `parameter_type` tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "categorical" => Some(Self::Categorical),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    /// Returns the tag used in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Categorical => "categorical",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated parameter definition.
///
/// Serializes to its definition document, with the kind stored under
/// `parameter_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "parameter_type")]
pub enum Parameter {
    #[serde(rename = "bool")]
    Bool(BoolParameter),
    #[serde(rename = "int")]
    Int(IntParameter),
    #[serde(rename = "float")]
    Float(FloatParameter),
    #[serde(rename = "str")]
    Str(StrParameter),
    #[serde(rename = "categorical")]
    Categorical(CategoricalParameter),
    #[serde(rename = "list")]
    List(ListParameter),
}

impl Parameter {
    /// Builds a parameter from a definition node.
    ///
    /// Field types are checked before construction and every domain
    /// invariant (bounds, option membership, element type) is validated, so
    /// a returned parameter is always usable.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownParameterType`] for an unrecognized
    /// `parameter_type`, [`ParameterError::MissingField`] /
    /// [`ParameterError::InvalidField`] / [`ParameterError::UnexpectedField`]
    /// for malformed fields, and the variant's invariant errors otherwise.
    pub fn from_definition(definition: &Value) -> Result<Self, ParameterError> {
        decode::from_definition(definition)
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Bool(_) => ParameterKind::Bool,
            Self::Int(_) => ParameterKind::Int,
            Self::Float(_) => ParameterKind::Float,
            Self::Str(_) => ParameterKind::Str,
            Self::Categorical(_) => ParameterKind::Categorical,
            Self::List(_) => ParameterKind::List,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Bool(p) => &p.name,
            Self::Int(p) => &p.name,
            Self::Float(p) => &p.name,
            Self::Str(p) => &p.name,
            Self::Categorical(p) => &p.name,
            Self::List(p) => &p.name,
        }
    }

    pub fn help(&self) -> &str {
        match self {
            Self::Bool(p) => &p.help,
            Self::Int(p) => &p.help,
            Self::Float(p) => &p.help,
            Self::Str(p) => &p.help,
            Self::Categorical(p) => &p.help,
            Self::List(p) => &p.help,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            Self::Bool(p) => p.required,
            Self::Int(p) => p.required,
            Self::Float(p) => p.required,
            Self::Str(p) => p.required,
            Self::Categorical(p) => p.required,
            Self::List(p) => p.required,
        }
    }

    /// Returns `true` for list parameters, which accept multiple values on
    /// the command line.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the default as a value (`null` when there is none).
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool(p) => Value::Bool(p.default),
            Self::Int(p) => p.default.map_or(Value::Null, Value::from),
            Self::Float(p) => p.default.map_or(Value::Null, Value::from),
            Self::Str(p) => p.default.clone().map_or(Value::Null, Value::String),
            Self::Categorical(p) => Value::String(p.default.clone()),
            Self::List(p) => Value::Array(p.default.clone()),
        }
    }

    /// Re-checks the variant's domain invariants.
    pub fn validate(&self) -> Result<(), ParameterError> {
        match self {
            Self::Bool(p) => p.validate(),
            Self::Int(p) => p.validate(),
            Self::Float(p) => p.validate(),
            Self::Str(p) => p.validate(),
            Self::Categorical(p) => p.validate(),
            Self::List(p) => p.validate(),
        }
    }

    /// Casts a raw value into this parameter's type.
    ///
    /// `null` passes through unchanged. Any conversion failure is reported as
    /// [`ParameterError::CastFailed`] carrying the parameter name.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramspec_core::{ListParameter, ValueType};
    /// use serde_json::{Value, json};
    ///
    /// let param = ListParameter::new("ids", "", true, ValueType::Int).build().unwrap();
    /// let casted = param.cast(&json!(["1", "2", "3"])).unwrap();
    /// assert_eq!(casted, json!([1, 2, 3]));
    /// assert_eq!(param.cast(&Value::Null).unwrap(), Value::Null);
    /// assert!(param.cast(&json!(["x"])).is_err());
    /// ```
    pub fn cast(&self, value: &Value) -> Result<Value, ParameterError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let result = match self {
            Self::Bool(_) => cast::to_bool(value),
            Self::Int(_) => cast::to_int(value),
            Self::Float(_) => cast::to_float(value),
            Self::Str(_) => cast::to_str(value),
            Self::Categorical(p) => p.cast_value(value),
            Self::List(p) => p.cast_value(value),
        };
        result.map_err(|reason| ParameterError::CastFailed {
            name: self.name().to_string(),
            value: render(value),
            reason,
        })
    }

    /// Casts a single command-line token.
    ///
    /// List parameters cast the token as one element; every other kind casts
    /// it as the whole value.
    pub fn cast_token(&self, token: &str) -> Result<Value, ParameterError> {
        let raw = Value::String(token.to_string());
        match self {
            Self::List(p) => {
                p.value_type
                    .cast_element(&raw)
                    .map_err(|reason| ParameterError::CastFailed {
                        name: p.name.clone(),
                        value: token.to_string(),
                        reason,
                    })
            }
            _ => self.cast(&raw),
        }
    }

    /// Draws a value according to the parameter's sampling rule.
    ///
    /// Strings and lists have no notion of randomness and return their
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnsupportedDistribution`] for a numeric
    /// parameter whose distribution is not `uniform`, and
    /// [`ParameterError::MissingBounds`] when its bounds are unset.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Value, ParameterError> {
        match self {
            Self::Bool(p) => Ok(p.sample(rng)),
            Self::Int(p) => p.sample(rng),
            Self::Float(p) => p.sample(rng),
            Self::Str(_) | Self::List(_) => Ok(self.default_value()),
            Self::Categorical(p) => Ok(p.sample(rng)),
        }
    }

    /// Serializes every field, including `parameter_type`.
    pub fn to_dict(&self) -> Value {
        // Serialization of these plain structs is infallible.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
