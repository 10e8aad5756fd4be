//! Describing parameters as command-line options.
//!
//! Every schema entry becomes an [`ArgSpec`]: a long flag built from the flat
//! key, a caster, the effective default, help text, a required marker and a
//! multiple-values marker for lists. Specs are handed to any
//! [`ArgumentSurface`], which is how the owning CLI layer registers them; the
//! core never touches process arguments itself. [`Configuration::cli_tokens`]
//! instead returns the tokens a caller may append to its own argument list.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::{Configuration, ValueOptions};
use crate::error::{ConfigError, ParameterError, Result};
use crate::parameter::{NONE_TOKEN, Parameter, ParameterKind, render};
use crate::transcode::FlatMap;

static LONG_FLAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("static regex must compile")
});

/// Returns the long flag for a flat key.
pub fn flag_for(key: &str) -> String {
    format!("--{key}")
}

/// Renders one value as a command-line token.
pub fn token_of(value: &Value) -> String {
    match value {
        Value::Null => NONE_TOKEN.to_string(),
        other => render(other),
    }
}

/// Renders a value as its command-line tokens; lists yield one per element.
pub fn tokens_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(token_of).collect(),
        other => vec![token_of(other)],
    }
}

/// A parameter described as a command-line option.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    /// Flat key; also the argument id on the surface.
    pub id: String,
    /// `--` followed by the flat key.
    pub flag: String,
    pub kind: ParameterKind,
    /// Effective value used when the flag is absent (`null` for none).
    pub default: Value,
    pub help: String,
    /// The flag must be given because the parameter is required and has no
    /// effective value.
    pub required: bool,
    /// The flag takes one or more values.
    pub multiple: bool,
    parameter: Parameter,
}

impl ArgSpec {
    /// Describes `parameter`, registered under `key`, with the given default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFlagName`] when the key does not form a
    /// valid long option (for example, it contains whitespace).
    ///
    /// # Examples
    ///
    /// ```
    /// use paramspec_core::{ArgSpec, ListParameter, ValueType};
    /// use serde_json::json;
    ///
    /// let param = ListParameter::new("sizes", "Layer sizes", true, ValueType::Int)
    ///     .build()
    ///     .unwrap();
    /// let spec = ArgSpec::new("model.sizes", &param, json!([8, 16])).unwrap();
    /// assert_eq!(spec.flag, "--model.sizes");
    /// assert!(spec.multiple);
    /// assert!(!spec.required);
    /// assert_eq!(spec.cast("4").unwrap(), json!(4));
    ///
    /// assert!(ArgSpec::new("bad key", &param, json!([])).is_err());
    /// ```
    pub fn new(key: &str, parameter: &Parameter, default: Value) -> Result<Self> {
        let flag = flag_for(key);
        if !LONG_FLAG_RE.is_match(&flag) {
            return Err(ConfigError::InvalidFlagName(flag));
        }
        Ok(Self {
            id: key.to_string(),
            flag,
            kind: parameter.kind(),
            required: parameter.required() && default.is_null(),
            default,
            help: parameter.help().to_string(),
            multiple: parameter.is_list(),
            parameter: parameter.clone(),
        })
    }

    /// Long option name without the leading dashes.
    pub fn long(&self) -> &str {
        self.flag.trim_start_matches('-')
    }

    /// Casts one command-line token (one element for list options).
    pub fn cast(&self, token: &str) -> std::result::Result<Value, ParameterError> {
        self.parameter.cast_token(token)
    }

    /// Help text with the kind and the effective default appended.
    pub fn help_text(&self) -> String {
        let mut text = self.help.clone();
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&format!("[{}", self.kind));
        if !self.default.is_null() {
            text.push_str(&format!(", default: {}", self.default_tokens().join(" ")));
        }
        text.push(']');
        text
    }

    /// Default rendered as command-line tokens.
    pub fn default_tokens(&self) -> Vec<String> {
        tokens_of(&self.default)
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }
}

/// Something options can be registered on, usually an argument parser.
pub trait ArgumentSurface {
    /// Returns `true` if an argument with this id is already registered.
    fn has_argument(&self, id: &str) -> bool;

    /// Registers one option.
    fn add_argument(&mut self, spec: ArgSpec) -> Result<()>;
}

impl Configuration {
    /// Describes every schema entry as an option, in schema order.
    ///
    /// Defaults are the effective values (explicit value, else schema
    /// default), so a loaded config is reflected without extra tokens.
    pub fn arg_specs(&self) -> Result<Vec<ArgSpec>> {
        let effective = self.get_flat_values(ValueOptions::default())?;
        self.schema()
            .iter()
            .map(|(key, parameter)| {
                let default = effective
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| parameter.default_value());
                ArgSpec::new(key, parameter, default)
            })
            .collect()
    }

    /// Registers every schema entry on `surface`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FlagConflict`] when the surface already has an
    /// argument with a generated id, including any reserved flags the caller
    /// registered beforehand.
    pub fn append_to<S: ArgumentSurface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        for spec in self.arg_specs()? {
            if surface.has_argument(&spec.id) {
                return Err(ConfigError::FlagConflict(spec.id));
            }
            debug!(flag = %spec.flag, kind = %spec.kind, "registering dynamic argument");
            surface.add_argument(spec)?;
        }
        Ok(())
    }

    /// Effective values rendered as command-line tokens.
    ///
    /// Scalars become a one-element list; lists become one token per
    /// element.
    pub fn values_as_strings(&self, random: bool, fill_defaults: bool) -> Result<Vec<(String, Vec<String>)>> {
        let options = ValueOptions::default()
            .with_random(random)
            .with_fill_defaults(fill_defaults);
        Ok(self
            .get_flat_values(options)?
            .iter()
            .map(|(key, value)| (key.clone(), tokens_of(value)))
            .collect())
    }

    /// Tokens for required parameters whose flag is absent from `existing`.
    ///
    /// Each missing flag is followed by its effective value tokens. Required
    /// parameters without any value are left for the parser to report.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramspec_core::Configuration;
    /// use serde_json::json;
    ///
    /// let config = Configuration::from_documents(None, Some(&json!({"a": 1, "b": [2, 3]}))).unwrap();
    /// let tokens = config.cli_tokens(&["--a".to_string(), "5".to_string()]).unwrap();
    /// assert_eq!(tokens, ["--b", "2", "3"]);
    /// ```
    pub fn cli_tokens(&self, existing: &[String]) -> Result<Vec<String>> {
        let values = self.get_flat_values(ValueOptions::default())?;
        let mut tokens = Vec::new();
        for (key, parameter) in self.schema().iter() {
            let flag = flag_for(key);
            if !parameter.required() || existing.contains(&flag) {
                continue;
            }
            match values.get(key) {
                Some(Value::Null) | None => continue,
                Some(value) => {
                    tokens.push(flag);
                    tokens.extend(tokens_of(value));
                }
            }
        }
        Ok(tokens)
    }

    /// Overwrites `args` with the effective values, or with fresh samples
    /// when `random` is set.
    pub fn apply_to(&self, args: &mut FlatMap, random: bool) -> Result<()> {
        let options = ValueOptions::default().with_random(random);
        for (key, value) in self.get_flat_values(options)? {
            args.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parameter::{BoolParameter, IntParameter, StrParameter};

    #[derive(Default)]
    struct Recorded {
        specs: Vec<ArgSpec>,
    }

    impl ArgumentSurface for Recorded {
        fn has_argument(&self, id: &str) -> bool {
            self.specs.iter().any(|spec| spec.id == id)
        }

        fn add_argument(&mut self, spec: ArgSpec) -> Result<()> {
            self.specs.push(spec);
            Ok(())
        }
    }

    fn spec_doc() -> Value {
        json!([
            {"name": "epochs", "help": "Epoch count", "required": true, "parameter_type": "int", "default": 3},
            {"name": "tag", "help": "", "required": false, "parameter_type": "str", "default": null},
            {"model": [
                {"name": "sizes", "help": "", "required": true, "parameter_type": "list",
                 "default": [1, 2], "value_type": "int"}
            ]}
        ])
    }

    #[test]
    fn test_append_to_registers_every_parameter() {
        let config = Configuration::from_documents(Some(&spec_doc()), None).unwrap();
        let mut surface = Recorded::default();
        config.append_to(&mut surface).unwrap();
        let flags: Vec<&str> = surface.specs.iter().map(|s| s.flag.as_str()).collect();
        assert_eq!(flags, ["--epochs", "--tag", "--model.sizes"]);
        assert!(surface.specs[2].multiple);
        assert_eq!(surface.specs[0].default, json!(3));
        assert_eq!(surface.specs[1].default, Value::Null);
        assert!(!surface.specs[1].required);
    }

    #[test]
    fn test_append_to_detects_collisions() {
        let config = Configuration::from_documents(Some(&spec_doc()), None).unwrap();
        let mut surface = Recorded::default();
        let taken = StrParameter::new("epochs", "", false).build().unwrap();
        surface.specs.push(ArgSpec::new("epochs", &taken, Value::Null).unwrap());
        let err = config.append_to(&mut surface).unwrap_err();
        assert!(matches!(err, ConfigError::FlagConflict(id) if id == "epochs"));
    }

    #[test]
    fn test_defaults_reflect_loaded_values() {
        let config =
            Configuration::from_documents(Some(&spec_doc()), Some(&json!({"epochs": 9}))).unwrap();
        let specs = config.arg_specs().unwrap();
        assert_eq!(specs[0].default, json!(9));
        assert_eq!(specs[0].help_text(), "Epoch count [int, default: 9]");
    }

    #[test]
    fn test_required_without_value_must_be_given() {
        let param = IntParameter::new("n", "", true).build().unwrap();
        assert!(ArgSpec::new("n", &param, Value::Null).unwrap().required);
        assert!(!ArgSpec::new("n", &param, json!(1)).unwrap().required);
    }

    #[test]
    fn test_tokens_render_null_as_none() {
        assert_eq!(tokens_of(&Value::Null), ["None"]);
        assert_eq!(tokens_of(&json!([1, "a", true])), ["1", "a", "true"]);
        let param = BoolParameter::new("b", "", true, false).build().unwrap();
        let spec = ArgSpec::new("b", &param, Value::Null).unwrap();
        assert_eq!(spec.cast(NONE_TOKEN).unwrap(), Value::Null);
    }

    #[test]
    fn test_values_as_strings_flattens_lists() {
        let config = Configuration::from_documents(Some(&spec_doc()), None).unwrap();
        let strings = config.values_as_strings(false, true).unwrap();
        assert_eq!(
            strings,
            vec![
                ("epochs".to_string(), vec!["3".to_string()]),
                ("model.sizes".to_string(), vec!["1".to_string(), "2".to_string()]),
            ]
        );
    }

    #[test]
    fn test_apply_to_overwrites_existing_entries() {
        let config =
            Configuration::from_documents(Some(&spec_doc()), Some(&json!({"epochs": 5}))).unwrap();
        let mut args = FlatMap::new();
        args.insert("epochs".into(), json!(1));
        args.insert("unrelated".into(), json!("kept"));
        config.apply_to(&mut args, false).unwrap();
        assert_eq!(args["epochs"], json!(5));
        assert_eq!(args["model.sizes"], json!([1, 2]));
        assert_eq!(args["unrelated"], json!("kept"));
    }
}
