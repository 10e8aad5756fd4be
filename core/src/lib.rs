//! Typed parameter schemas, nested/flat document transcoding and layered
//! configuration values.
//!
//! This crate turns a declarative parameter schema (a *spec*) and optional
//! value overrides (a *config*) into a validated, typed set of values usable
//! programmatically and as command-line options:
//!
//! - [`Parameter`] — one typed unit of configuration (bool, int, float, str,
//!   categorical, list) with casting, validation and sampling.
//! - [`flatten`] / [`expand`] — conversion between nested JSON/YAML documents
//!   and dot-keyed flat maps.
//! - [`SchemaRegistry`] — ordered flat name → parameter mapping built from a
//!   spec document.
//! - [`Configuration`] — schema plus explicit values, resolving effective
//!   values by `random > explicit > default` and merging right-biased.
//! - [`infer_parameter`] — schema inference from plain values when no spec
//!   is available.
//! - [`ArgSpec`] / [`ArgumentSurface`] — parameters described as CLI
//!   options, with a `clap` adapter ([`DynamicCommand`]) behind the `clap`
//!   feature.
//!
//! # Example
//!
//! ```
//! use paramspec_core::*;
//! use serde_json::json;
//!
//! let spec = json!([
//!     {"name": "lr", "help": "Learning rate", "required": true,
//!      "parameter_type": "float", "default": 0.01, "p1": 0.0001, "p2": 0.1},
//!     {"model": [
//!         {"name": "activation", "help": "", "required": true,
//!          "parameter_type": "categorical", "default": "relu",
//!          "options": ["relu", "gelu"]}
//!     ]}
//! ]);
//! let config = json!({"model": {"activation": "gelu"}});
//!
//! let store = Configuration::from_documents(Some(&spec), Some(&config)).unwrap();
//! let values = store.get_values(ValueOptions::default().with_expand(true)).unwrap();
//! assert_eq!(values, json!({"lr": 0.01, "model": {"activation": "gelu"}}));
//!
//! let sampled = store.get_values(ValueOptions::default().with_random(true)).unwrap();
//! let lr = sampled["lr"].as_f64().unwrap();
//! assert!((0.0001..0.1).contains(&lr));
//! ```

mod args;
#[cfg(feature = "clap")]
mod command;
mod config;
mod document;
mod error;
mod infer;
mod parameter;
mod registry;
mod transcode;

pub use args::{ArgSpec, ArgumentSurface, flag_for, token_of, tokens_of};
#[cfg(feature = "clap")]
pub use command::DynamicCommand;
pub use config::{Configuration, ValueOptions};
pub use document::{DocumentFormat, load_document, save_document, save_document_as};
pub use error::{ConfigError, ParameterError, Result};
pub use infer::{NO_HELP, infer_parameter, infer_registry};
pub use parameter::{
    BoolParameter, CategoricalParameter, FloatParameter, IntParameter, ListParameter, Parameter,
    ParameterKind, StrParameter, UNIFORM, ValueType,
};
pub use registry::SchemaRegistry;
pub use transcode::{
    DocumentKind, FlatMap, NodeKind, SEPARATOR, classify, contains_parameter_definition, expand,
    flatten, is_parameter_definition,
};
