//! The configuration store: a schema plus explicitly set values.
//!
//! A [`Configuration`] resolves an *effective value* for every schema entry
//! by precedence `random sample > explicit value > schema default`. Optional
//! parameters without an explicit value are always omitted; required ones
//! fall back to their default unless `fill_defaults` is off.
//!
//! The parameter set is fixed once loaded, but values can be set by name and
//! two stores can be merged (right-biased on key collisions).
//!
//! # Example
//!
//! ```
//! use paramspec_core::{Configuration, ValueOptions};
//! use serde_json::json;
//!
//! let spec = json!([
//!     {"name": "n", "help": "h", "required": true,
//!      "parameter_type": "int", "default": 5, "p1": 1, "p2": 10}
//! ]);
//! let mut config = Configuration::from_documents(Some(&spec), None).unwrap();
//! assert_eq!(config.get_values(ValueOptions::default()).unwrap(), json!({"n": 5}));
//!
//! config.set_value("n", &json!("7")).unwrap();
//! assert_eq!(config.get_values(ValueOptions::default()).unwrap(), json!({"n": 7}));
//! ```

use std::path::Path;

use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{load_document, save_document};
use crate::error::{ConfigError, Result};
use crate::infer::infer_registry;
use crate::registry::SchemaRegistry;
use crate::transcode::{DocumentKind, FlatMap, expand, flatten};

/// Options for [`Configuration::get_values`].
///
/// Defaults: no sampling, defaults filled in, flat output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueOptions {
    /// Replace every returned value with a fresh sample.
    pub random: bool,
    /// Use schema defaults for required parameters without an explicit value.
    pub fill_defaults: bool,
    /// Return a nested mapping instead of flat dotted keys.
    pub expand: bool,
}

impl Default for ValueOptions {
    fn default() -> Self {
        Self {
            random: false,
            fill_defaults: true,
            expand: false,
        }
    }
}

impl ValueOptions {
    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    pub fn with_fill_defaults(mut self, fill_defaults: bool) -> Self {
        self.fill_defaults = fill_defaults;
        self
    }

    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }
}

/// Schema registry plus explicitly set values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    schema: SchemaRegistry,
    values: FlatMap,
    has_spec: bool,
}

impl Configuration {
    /// Creates an empty store with no schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing registry with no explicit values.
    pub fn with_schema(schema: SchemaRegistry) -> Self {
        Self {
            schema,
            values: FlatMap::new(),
            has_spec: true,
        }
    }

    /// Builds a store from an optional spec and an optional config document.
    ///
    /// Without a spec, the schema is inferred from the config values.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed definition, uninferable value, unknown
    /// config key or failed cast. No partially loaded store is returned.
    pub fn from_documents(spec: Option<&Value>, config: Option<&Value>) -> Result<Self> {
        let mut store = Self::new();
        if let Some(spec) = spec {
            store.load_spec(spec)?;
        }
        if let Some(config) = config {
            store.load_config(config)?;
        }
        Ok(store)
    }

    /// Adds every definition of a spec document to the schema.
    pub fn load_spec(&mut self, spec: &Value) -> Result<()> {
        let registry = SchemaRegistry::from_document(spec)?;
        for (key, parameter) in registry.iter() {
            self.schema.insert(key, parameter.clone());
        }
        self.has_spec = true;
        Ok(())
    }

    /// Sets every value of a config document.
    ///
    /// When no spec has been loaded, a parameter is first inferred for each
    /// value.
    ///
    /// # Errors
    ///
    /// Fails on an uninferable value, an unknown key or a failed cast. The
    /// store is left unchanged on error.
    pub fn load_config(&mut self, config: &Value) -> Result<()> {
        let flat = flatten(config, DocumentKind::Config)?;
        let inferred = if self.has_spec {
            None
        } else {
            warn!("no spec loaded, inferring schema from config values");
            Some(infer_registry(&flat)?)
        };

        let mut values = FlatMap::new();
        for (key, raw) in &flat {
            let parameter = inferred
                .as_ref()
                .and_then(|registry| registry.get(key))
                .or_else(|| self.schema.get(key))
                .ok_or_else(|| ConfigError::UnknownParameter(key.clone()))?;
            values.insert(key.clone(), parameter.cast(raw)?);
        }

        if let Some(inferred) = inferred {
            for (key, parameter) in inferred.iter() {
                self.schema.insert(key, parameter.clone());
            }
        }
        self.values.extend(values);
        debug!(values = flat.len(), "loaded config values");
        Ok(())
    }

    /// Loads a spec file (JSON or YAML) into the schema.
    pub fn load_spec_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_spec(&load_document(path)?)
    }

    /// Loads a config file (JSON or YAML) into the values.
    pub fn load_config_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_config(&load_document(path)?)
    }

    /// Writes the effective values as a nested JSON document.
    pub fn save_config_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let values = self.get_values(ValueOptions::default().with_expand(true))?;
        save_document(path, &values)
    }

    /// Writes the schema as a nested spec document.
    pub fn save_spec_file(&self, path: impl AsRef<Path>) -> Result<()> {
        save_document(path, &self.schema.to_document()?)
    }

    /// Returns `true` if the schema came from a spec rather than inference.
    pub fn has_spec(&self) -> bool {
        self.has_spec && !self.schema.is_empty()
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Values set explicitly, already cast.
    pub fn explicit_values(&self) -> &FlatMap {
        &self.values
    }

    /// Casts and stores a value for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownParameter`] if `name` is not in the
    /// schema, or [`ConfigError::Parameter`] if the cast fails.
    pub fn set_value(&mut self, name: &str, raw: &Value) -> Result<()> {
        let parameter = self
            .schema
            .get(name)
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))?;
        let value = parameter.cast(raw)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Resolves effective values using the thread-local random source.
    ///
    /// Returns a flat mapping, or a nested one when `options.expand` is set.
    pub fn get_values(&self, options: ValueOptions) -> Result<Value> {
        self.get_values_with_rng(options, &mut rand::rng())
    }

    /// Resolves effective values, sampling from `rng` when requested.
    pub fn get_values_with_rng<R: Rng + ?Sized>(
        &self,
        options: ValueOptions,
        rng: &mut R,
    ) -> Result<Value> {
        let flat = self.resolve(options, rng)?;
        if options.expand {
            expand(&flat, DocumentKind::Config)
        } else {
            Ok(Value::Object(flat))
        }
    }

    /// Resolves effective values as flat dotted keys, ignoring
    /// `options.expand`.
    pub fn get_flat_values(&self, options: ValueOptions) -> Result<FlatMap> {
        self.resolve(options, &mut rand::rng())
    }

    fn resolve<R: Rng + ?Sized>(&self, options: ValueOptions, rng: &mut R) -> Result<FlatMap> {
        let mut resolved = FlatMap::new();
        for (name, parameter) in self.schema.iter() {
            let explicit = self.values.get(name);
            if !parameter.required() && explicit.is_none() {
                continue;
            }
            let value = if options.random {
                parameter.sample(rng)?
            } else if let Some(value) = explicit {
                value.clone()
            } else if options.fill_defaults {
                parameter.default_value()
            } else {
                continue;
            };
            resolved.insert(name.to_string(), value);
        }
        Ok(resolved)
    }

    /// Returns a new store holding the right-biased union of both schemas
    /// and both value sets. Neither operand changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramspec_core::{Configuration, ValueOptions};
    /// use serde_json::json;
    ///
    /// let a = Configuration::from_documents(None, Some(&json!({"x": 1, "y": 2}))).unwrap();
    /// let b = Configuration::from_documents(None, Some(&json!({"y": 9, "z": 3}))).unwrap();
    /// let merged = a.merge_with(&b);
    /// assert_eq!(
    ///     merged.get_values(ValueOptions::default()).unwrap(),
    ///     json!({"x": 1, "y": 9, "z": 3})
    /// );
    /// ```
    pub fn merge_with(&self, other: &Configuration) -> Configuration {
        let mut merged = self.clone();
        merged.merge_from(other);
        merged
    }

    /// Merges `other` into this store in place; `other` wins on collisions.
    ///
    /// A value kept from this store whose parameter `other` replaces is
    /// re-cast against the new parameter, and dropped if that cast fails.
    pub fn merge_from(&mut self, other: &Configuration) -> &mut Self {
        for (key, parameter) in other.schema.iter() {
            self.schema.insert(key, parameter.clone());
            if other.values.contains_key(key) {
                continue;
            }
            let Some(kept) = self.values.get(key) else {
                continue;
            };
            match parameter.cast(kept) {
                Ok(value) => {
                    self.values.insert(key.to_string(), value);
                }
                Err(err) => {
                    debug!(key, error = %err, "dropping value rejected by merged parameter");
                    self.values.remove(key);
                }
            }
        }
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        self.has_spec |= other.has_spec;
        debug!(
            parameters = self.schema.len(),
            values = self.values.len(),
            "merged configurations"
        );
        self
    }

    /// Re-casts externally parsed arguments against the schema.
    ///
    /// A failed cast or a missing entry is an error for required parameters
    /// and ignored for optional ones.
    pub fn validate_args(&self, args: &FlatMap) -> Result<()> {
        for (name, parameter) in self.schema.iter() {
            let outcome = match args.get(name) {
                Some(value) => parameter.cast(value).map(drop).map_err(ConfigError::from),
                None => Err(ConfigError::MissingArgument(name.to_string())),
            };
            match outcome {
                Err(err) if parameter.required() => return Err(err),
                Err(err) => debug!(name, error = %err, "ignoring invalid optional argument"),
                Ok(()) => {}
            }
        }
        Ok(())
    }
}
