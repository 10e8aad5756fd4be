//! Error types for parameter construction, casting and configuration loading.
//!
//! [`ParameterError`] covers a single parameter definition: malformed fields,
//! violated domain invariants, failed casts and unsupported sampling.
//! [`ConfigError`] wraps those with the flat key they occurred under and adds
//! the registry, store, transcoder and file I/O failure modes.

use thiserror::Error;

/// Errors raised by a single parameter definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// The parameter name is empty or whitespace-only.
    #[error("parameter name cannot be empty")]
    EmptyName,

    /// A definition field is absent.
    #[error("parameter '{name}' is missing required field '{field}'")]
    MissingField { name: String, field: String },

    /// A definition field holds a value of the wrong type.
    #[error("field '{field}' has value {value} but expected {expected}")]
    InvalidField {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// A definition carries a field the parameter type does not declare.
    #[error("parameter '{name}' does not accept field '{field}'")]
    UnexpectedField { name: String, field: String },

    /// The `parameter_type` tag is not one of the known kinds.
    #[error("unrecognized parameter type '{0}'")]
    UnknownParameterType(String),

    /// A list parameter names an element type that has no caster.
    #[error("parameter '{name}' has unsupported value_type '{value_type}'")]
    UnknownValueType { name: String, value_type: String },

    /// `p1` is greater than `p2`, or a bound is not finite.
    #[error("parameter '{name}' has invalid bounds p1={p1} p2={p2}")]
    InvalidBounds { name: String, p1: String, p2: String },

    /// The default lies outside `[p1, p2]`.
    #[error("parameter '{name}' default {default} is outside bounds [{p1}, {p2}]")]
    DefaultOutOfBounds {
        name: String,
        default: String,
        p1: String,
        p2: String,
    },

    /// A categorical default is not one of its options.
    #[error("default value '{default}' not in options list {options:?}")]
    DefaultNotInOptions {
        name: String,
        default: String,
        options: Vec<String>,
    },

    /// A value could not be converted to the parameter's type.
    #[error("casting failed for parameter name={name} value={value}: {reason}")]
    CastFailed {
        name: String,
        value: String,
        reason: String,
    },

    /// Sampling was requested with a distribution other than `uniform`.
    #[error("unsupported distribution '{distribution}' for parameter '{name}'")]
    UnsupportedDistribution { name: String, distribution: String },

    /// Sampling a numeric parameter requires both `p1` and `p2`.
    #[error("parameter '{name}' cannot be sampled without p1 and p2")]
    MissingBounds { name: String },
}

/// Errors raised while building, querying or persisting a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A parameter definition under `key` failed to construct.
    #[error("invalid parameter definition '{key}': {source}")]
    InvalidDefinition {
        key: String,
        #[source]
        source: ParameterError,
    },

    /// A parameter-level failure outside of definition loading
    /// (casting, sampling).
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// `set_value` was called with a name the schema does not contain.
    #[error("parameter name '{0}' not recognized in schema")]
    UnknownParameter(String),

    /// A required parameter has no value in an externally parsed argument set.
    #[error("required parameter '{0}' is missing from the parsed arguments")]
    MissingArgument(String),

    /// No parameter type could be inferred for a raw value.
    #[error("cannot infer type for variable {key} of type {kind} and value {value}")]
    CannotInfer {
        key: String,
        kind: &'static str,
        value: String,
    },

    /// A document root is neither a mapping nor a list.
    #[error("document root must be a mapping or a list, found {0}")]
    InvalidDocumentRoot(&'static str),

    /// A dotted key descends through a path already holding a value.
    #[error("key '{0}' collides with a value set at a shallower level")]
    PathCollision(String),

    /// A generated flag is already registered on the argument surface.
    #[error("can't add dynamic config '{0}', argument already exists")]
    FlagConflict(String),

    /// A generated flag name is not a valid long option.
    #[error("invalid generated flag name: {0}")]
    InvalidFlagName(String),

    /// A file extension other than `.json`, `.yaml` or `.yml`.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
