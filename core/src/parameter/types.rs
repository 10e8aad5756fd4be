//! Parameter variant definitions.
//!
//! One struct per `parameter_type` tag. Each struct owns its fields, a
//! `validate` check for the domain invariants that the type system cannot
//! express, its caster and its sampling rule. Structs are assembled with
//! `new` plus `with_*` builders and finished with `build`, which validates
//! and wraps the struct into a [`Parameter`].

use rand::Rng;
use rand::distr::{Distribution, Uniform};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Parameter;
use super::cast;
use crate::error::ParameterError;

/// The only distribution the numeric parameters know how to sample.
pub const UNIFORM: &str = "uniform";

fn default_distribution() -> String {
    UNIFORM.to_string()
}

fn constant_by_default() -> bool {
    true
}

fn check_name(name: &str) -> Result<(), ParameterError> {
    if name.trim().is_empty() {
        return Err(ParameterError::EmptyName);
    }
    Ok(())
}

fn invalid_bounds<T: ToString>(name: &str, p1: Option<T>, p2: Option<T>) -> ParameterError {
    ParameterError::InvalidBounds {
        name: name.to_string(),
        p1: display_bound(p1),
        p2: display_bound(p2),
    }
}

fn unsupported(name: &str, distribution: &str) -> ParameterError {
    ParameterError::UnsupportedDistribution {
        name: name.to_string(),
        distribution: distribution.to_string(),
    }
}

/// Element type of a [`ListParameter`].
///
/// # Examples
///
/// ```
/// use paramspec_core::ValueType;
///
/// assert_eq!(ValueType::parse("int"), Some(ValueType::Int));
/// assert_eq!(ValueType::Dict.as_str(), "dict");
/// assert_eq!(ValueType::parse("tuple"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
    Dict,
}

impl ValueType {
    /// Parses a `value_type` tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "bool" => Some(Self::Bool),
            "dict" => Some(Self::Dict),
            _ => None,
        }
    }

    /// Returns the tag used in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Dict => "dict",
        }
    }

    /// Casts a single element, returning a failure reason on error.
    pub(crate) fn cast_element(&self, value: &Value) -> Result<Value, String> {
        match self {
            Self::Int => cast::to_int(value),
            Self::Float => cast::to_float(value),
            Self::Str => cast::to_str(value),
            Self::Bool => cast::to_bool(value),
            Self::Dict => cast::to_dict(value),
        }
    }
}

/// Boolean switch (`parameter_type: "bool"`).
///
/// # Examples
///
/// ```
/// use paramspec_core::BoolParameter;
///
/// let param = BoolParameter::new("shuffle", "Shuffle inputs", true, false)
///     .build()
///     .unwrap();
/// assert!(!param.is_list());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolParameter {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub default: bool,
    /// When `true` (the default), sampling always returns `default`.
    #[serde(default = "constant_by_default")]
    pub is_constant: bool,
}

impl BoolParameter {
    pub fn new(name: &str, help: &str, required: bool, default: bool) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required,
            default,
            is_constant: constant_by_default(),
        }
    }

    /// Lets sampling flip a fair coin instead of returning the default.
    pub fn sampled(mut self) -> Self {
        self.is_constant = false;
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_name(&self.name)
    }

    pub fn build(self) -> Result<Parameter, ParameterError> {
        self.validate()?;
        Ok(Parameter::Bool(self))
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        if self.is_constant {
            Value::Bool(self.default)
        } else {
            Value::Bool(rng.random_bool(0.5))
        }
    }
}

/// Integer parameter with optional uniform sampling bounds
/// (`parameter_type: "int"`).
///
/// # Examples
///
/// ```
/// use paramspec_core::IntParameter;
///
/// let param = IntParameter::new("epochs", "Training epochs", true)
///     .with_default(5)
///     .with_bounds(1, 10)
///     .build()
///     .unwrap();
/// assert_eq!(param.default_value(), serde_json::json!(5));
///
/// // A default outside the bounds is rejected at construction.
/// assert!(IntParameter::new("epochs", "", true)
///     .with_default(50)
///     .with_bounds(1, 10)
///     .build()
///     .is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntParameter {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub default: Option<i64>,
    #[serde(default = "default_distribution")]
    pub distribution: String,
    pub p1: Option<i64>,
    pub p2: Option<i64>,
}

impl IntParameter {
    pub fn new(name: &str, help: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required,
            default: None,
            distribution: default_distribution(),
            p1: None,
            p2: None,
        }
    }

    pub fn with_default(mut self, default: i64) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the inclusive sampling range `[p1, p2]`.
    pub fn with_bounds(mut self, p1: i64, p2: i64) -> Self {
        self.p1 = Some(p1);
        self.p2 = Some(p2);
        self
    }

    pub fn with_distribution(mut self, distribution: &str) -> Self {
        self.distribution = distribution.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_name(&self.name)?;
        if let (Some(p1), Some(p2)) = (self.p1, self.p2) {
            if p1 > p2 {
                return Err(invalid_bounds(&self.name, self.p1, self.p2));
            }
        }
        if let Some(default) = self.default {
            let below = self.p1.is_some_and(|p1| default < p1);
            let above = self.p2.is_some_and(|p2| default > p2);
            if below || above {
                return Err(ParameterError::DefaultOutOfBounds {
                    name: self.name.clone(),
                    default: default.to_string(),
                    p1: display_bound(self.p1),
                    p2: display_bound(self.p2),
                });
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<Parameter, ParameterError> {
        self.validate()?;
        Ok(Parameter::Int(self))
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Value, ParameterError> {
        if self.distribution != UNIFORM {
            return Err(unsupported(&self.name, &self.distribution));
        }
        let (Some(p1), Some(p2)) = (self.p1, self.p2) else {
            return Err(ParameterError::MissingBounds {
                name: self.name.clone(),
            });
        };
        let range = Uniform::new_inclusive(p1, p2)
            .map_err(|_| invalid_bounds(&self.name, self.p1, self.p2))?;
        Ok(Value::from(range.sample(rng)))
    }
}

/// Floating-point parameter with optional uniform sampling bounds
/// (`parameter_type: "float"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatParameter {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub default: Option<f64>,
    #[serde(default = "default_distribution")]
    pub distribution: String,
    pub p1: Option<f64>,
    pub p2: Option<f64>,
}

impl FloatParameter {
    pub fn new(name: &str, help: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required,
            default: None,
            distribution: default_distribution(),
            p1: None,
            p2: None,
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the half-open sampling range `[p1, p2)`.
    pub fn with_bounds(mut self, p1: f64, p2: f64) -> Self {
        self.p1 = Some(p1);
        self.p2 = Some(p2);
        self
    }

    pub fn with_distribution(mut self, distribution: &str) -> Self {
        self.distribution = distribution.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_name(&self.name)?;
        let finite = |bound: Option<f64>| bound.is_none_or(f64::is_finite);
        // The span must stay finite as well, or the range cannot be sampled.
        let ordered = match (self.p1, self.p2) {
            (Some(p1), Some(p2)) => p1 <= p2 && (p2 - p1).is_finite(),
            _ => true,
        };
        if !finite(self.p1) || !finite(self.p2) || !ordered {
            return Err(invalid_bounds(&self.name, self.p1, self.p2));
        }
        if let Some(default) = self.default {
            let below = self.p1.is_some_and(|p1| default < p1);
            let above = self.p2.is_some_and(|p2| default > p2);
            if below || above || !default.is_finite() {
                return Err(ParameterError::DefaultOutOfBounds {
                    name: self.name.clone(),
                    default: default.to_string(),
                    p1: display_bound(self.p1),
                    p2: display_bound(self.p2),
                });
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<Parameter, ParameterError> {
        self.validate()?;
        Ok(Parameter::Float(self))
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Value, ParameterError> {
        if self.distribution != UNIFORM {
            return Err(unsupported(&self.name, &self.distribution));
        }
        let (Some(p1), Some(p2)) = (self.p1, self.p2) else {
            return Err(ParameterError::MissingBounds {
                name: self.name.clone(),
            });
        };
        // An empty range has exactly one admissible value.
        if p1 == p2 {
            return Ok(Value::from(p1));
        }
        let range =
            Uniform::new(p1, p2).map_err(|_| invalid_bounds(&self.name, self.p1, self.p2))?;
        Ok(Value::from(range.sample(rng)))
    }
}

/// Free-form string parameter (`parameter_type: "str"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrParameter {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub default: Option<String>,
}

impl StrParameter {
    pub fn new(name: &str, help: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required,
            default: None,
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_name(&self.name)
    }

    pub fn build(self) -> Result<Parameter, ParameterError> {
        self.validate()?;
        Ok(Parameter::Str(self))
    }
}

/// One-of-N string choice (`parameter_type: "categorical"`).
///
/// # Examples
///
/// ```
/// use paramspec_core::CategoricalParameter;
///
/// let options = ["relu", "gelu"];
/// assert!(CategoricalParameter::new("activation", "", true, "relu", &options)
///     .build()
///     .is_ok());
/// assert!(CategoricalParameter::new("activation", "", true, "tanh", &options)
///     .build()
///     .is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalParameter {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub default: String,
    pub options: Vec<String>,
}

impl CategoricalParameter {
    pub fn new(name: &str, help: &str, required: bool, default: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required,
            default: default.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_name(&self.name)?;
        if !self.options.contains(&self.default) {
            return Err(ParameterError::DefaultNotInOptions {
                name: self.name.clone(),
                default: self.default.clone(),
                options: self.options.clone(),
            });
        }
        Ok(())
    }

    pub fn build(self) -> Result<Parameter, ParameterError> {
        self.validate()?;
        Ok(Parameter::Categorical(self))
    }

    pub(crate) fn cast_value(&self, value: &Value) -> Result<Value, String> {
        let casted = cast::render(value);
        if !self.options.contains(&casted) {
            return Err(format!(
                "value '{casted}' not in options list {:?}",
                self.options
            ));
        }
        Ok(Value::String(casted))
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        self.options
            .choose(rng)
            .map(|choice| Value::String(choice.clone()))
            .unwrap_or_else(|| Value::String(self.default.clone()))
    }
}

/// Sequence of homogeneous elements (`parameter_type: "list"`).
///
/// # Examples
///
/// ```
/// use paramspec_core::{ListParameter, ValueType};
/// use serde_json::json;
///
/// let param = ListParameter::new("sizes", "Layer sizes", true, ValueType::Int)
///     .with_default(vec![json!(8), json!(16)])
///     .build()
///     .unwrap();
/// assert!(param.is_list());
/// assert_eq!(param.cast(&json!(["1", "2"])).unwrap(), json!([1, 2]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListParameter {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub default: Vec<Value>,
    pub value_type: ValueType,
}

impl ListParameter {
    pub fn new(name: &str, help: &str, required: bool, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required,
            default: Vec::new(),
            value_type,
        }
    }

    pub fn with_default(mut self, default: Vec<Value>) -> Self {
        self.default = default;
        self
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_name(&self.name)
    }

    pub fn build(self) -> Result<Parameter, ParameterError> {
        self.validate()?;
        Ok(Parameter::List(self))
    }

    pub(crate) fn cast_value(&self, value: &Value) -> Result<Value, String> {
        let Value::Array(items) = value else {
            return Err(format!(
                "expected a list, found {}",
                cast::kind_of(value)
            ));
        };
        items
            .iter()
            .map(|item| self.value_type.cast_element(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

fn display_bound<T: ToString>(bound: Option<T>) -> String {
    bound.map_or_else(|| "None".to_string(), |b| b.to_string())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_int_bounds_reject_default_outside_range() {
        let low = IntParameter::new("n", "h", true).with_default(0).with_bounds(1, 10);
        assert!(matches!(
            low.validate(),
            Err(ParameterError::DefaultOutOfBounds { .. })
        ));
        let high = IntParameter::new("n", "h", true).with_default(11).with_bounds(1, 10);
        assert!(matches!(
            high.validate(),
            Err(ParameterError::DefaultOutOfBounds { .. })
        ));
        let edge = IntParameter::new("n", "h", true).with_default(10).with_bounds(1, 10);
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_int_rejects_inverted_bounds() {
        let param = IntParameter::new("n", "h", true).with_bounds(5, 1);
        assert!(matches!(
            param.validate(),
            Err(ParameterError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_int_sample_stays_inclusive() {
        let param = IntParameter::new("n", "h", true).with_bounds(1, 3);
        let mut rng = rng();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let v = param.sample(&mut rng).unwrap().as_i64().unwrap();
            assert!((1..=3).contains(&v));
            seen.insert(v);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_int_sample_without_bounds_fails() {
        let param = IntParameter::new("n", "h", true).with_default(3);
        assert!(matches!(
            param.sample(&mut rng()),
            Err(ParameterError::MissingBounds { .. })
        ));
    }

    #[test]
    fn test_unknown_distribution_fails_at_sample_time() {
        let param = FloatParameter::new("lr", "h", true)
            .with_bounds(0.0, 1.0)
            .with_distribution("normal");
        assert!(param.validate().is_ok());
        assert!(matches!(
            param.sample(&mut rng()),
            Err(ParameterError::UnsupportedDistribution { .. })
        ));
    }

    #[test]
    fn test_float_sample_is_half_open() {
        let param = FloatParameter::new("lr", "h", true).with_bounds(0.5, 1.5);
        let mut rng = rng();
        for _ in 0..200 {
            let v = param.sample(&mut rng).unwrap().as_f64().unwrap();
            assert!((0.5..1.5).contains(&v));
        }
    }

    #[test]
    fn test_float_degenerate_range_returns_bound() {
        let param = FloatParameter::new("lr", "h", true)
            .with_default(0.1)
            .with_bounds(0.1, 0.1);
        assert_eq!(param.sample(&mut rng()).unwrap(), json!(0.1));
    }

    #[test]
    fn test_float_bounds_with_overflowing_span_rejected() {
        let param = FloatParameter::new("x", "h", true)
            .with_default(0.0)
            .with_bounds(-1e308, 1e308);
        assert!(matches!(
            param.validate(),
            Err(ParameterError::InvalidBounds { .. })
        ));
        assert!(matches!(
            param.sample(&mut rng()),
            Err(ParameterError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_unvalidated_inverted_bounds_fail_to_sample() {
        let int = IntParameter {
            p1: Some(5),
            p2: Some(1),
            ..IntParameter::new("n", "h", true)
        };
        assert!(matches!(
            int.sample(&mut rng()),
            Err(ParameterError::InvalidBounds { .. })
        ));

        let float = FloatParameter {
            p1: Some(2.0),
            p2: Some(1.0),
            ..FloatParameter::new("lr", "h", true)
        };
        assert!(matches!(
            float.sample(&mut rng()),
            Err(ParameterError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_bool_constant_sampling_returns_default() {
        let param = BoolParameter::new("flag", "h", true, true);
        let mut rng = rng();
        assert!((0..20).all(|_| param.sample(&mut rng) == json!(true)));
    }

    #[test]
    fn test_bool_sampled_produces_both_values() {
        let param = BoolParameter::new("flag", "h", true, true).sampled();
        let mut rng = rng();
        let draws: Vec<Value> = (0..100).map(|_| param.sample(&mut rng)).collect();
        assert!(draws.contains(&json!(true)));
        assert!(draws.contains(&json!(false)));
    }

    #[test]
    fn test_categorical_sample_draws_from_options() {
        let param = CategoricalParameter::new("act", "h", true, "a", &["a", "b", "c"]);
        let mut rng = rng();
        for _ in 0..50 {
            let v = param.sample(&mut rng);
            assert!(["a", "b", "c"].contains(&v.as_str().unwrap()));
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            StrParameter::new("  ", "h", false).validate(),
            Err(ParameterError::EmptyName)
        );
    }
}
