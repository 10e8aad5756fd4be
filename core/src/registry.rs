//! Ordered registry of qualified names to parameters.
//!
//! A [`SchemaRegistry`] is built by flattening a spec document and decoding
//! every parameter-definition leaf. Iteration follows source order, so help
//! output and saved specs list parameters as they were declared.
//!
//! # Example
//!
//! ```
//! use paramspec_core::SchemaRegistry;
//! use serde_json::json;
//!
//! let spec = json!([
//!     {"name": "lr", "help": "learning rate", "required": true,
//!      "parameter_type": "float", "default": 0.1, "p1": 0.0, "p2": 1.0},
//!     {"model": [
//!         {"name": "depth", "help": "", "required": true,
//!          "parameter_type": "int", "default": 4}
//!     ]}
//! ]);
//! let registry = SchemaRegistry::from_document(&spec).unwrap();
//! assert_eq!(registry.names().collect::<Vec<_>>(), ["lr", "model.depth"]);
//!
//! let saved = registry.to_document().unwrap();
//! assert_eq!(SchemaRegistry::from_document(&saved).unwrap(), registry);
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::parameter::Parameter;
use crate::transcode::{DocumentKind, FlatMap, expand, flatten, is_parameter_definition};

/// Parameters keyed by flat name, in insertion order with O(1) lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    entries: Vec<(String, Parameter)>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a spec document and decodes every definition in it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefinition`] naming the flat key of the
    /// first definition that fails to decode (including an unknown
    /// `parameter_type`), or a transcoder error for a malformed document.
    pub fn from_document(document: &Value) -> Result<Self> {
        let flat = flatten(document, DocumentKind::Spec)?;
        Self::from_flat(&flat)
    }

    /// Decodes an already-flattened spec map.
    ///
    /// Leaves that are not parameter definitions are skipped.
    pub fn from_flat(flat: &FlatMap) -> Result<Self> {
        let mut registry = Self::new();
        for (key, node) in flat {
            if !is_parameter_definition(node, DocumentKind::Spec) {
                debug!(key = %key, "skipping non-definition leaf in spec");
                continue;
            }
            let parameter = Parameter::from_definition(node).map_err(|source| {
                ConfigError::InvalidDefinition {
                    key: key.clone(),
                    source,
                }
            })?;
            registry.insert(key.clone(), parameter);
        }
        debug!(parameters = registry.len(), "loaded schema registry");
        Ok(registry)
    }

    /// Serializes every parameter and expands the result to a spec document.
    pub fn to_document(&self) -> Result<Value> {
        expand(&self.to_flat(), DocumentKind::Spec)
    }

    /// Returns the flat map of definition documents.
    pub fn to_flat(&self) -> FlatMap {
        self.entries
            .iter()
            .map(|(key, parameter)| (key.clone(), parameter.to_dict()))
            .collect()
    }

    /// Inserts a parameter, replacing an existing entry in place.
    ///
    /// Returns the replaced parameter, if any.
    pub fn insert(&mut self, key: impl Into<String>, parameter: Parameter) -> Option<Parameter> {
        let key = key.into();
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, parameter));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, parameter));
        None
    }

    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates flat names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterates `(name, parameter)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries
            .iter()
            .map(|(key, parameter)| (key.as_str(), parameter))
    }
}

impl<'a> IntoIterator for &'a SchemaRegistry {
    type Item = (&'a str, &'a Parameter);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Parameter)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
