//! `clap` integration for dynamic parameters.
//!
//! [`DynamicCommand`] wraps a [`clap::Command`] and implements
//! [`ArgumentSurface`], so a [`Configuration`](crate::Configuration) can add
//! one long option per schema entry. Parsed matches are turned back into a
//! [`FlatMap`] holding only the flags that were actually given.
//!
//! # Example
//!
//! ```
//! use clap::Command;
//! use paramspec_core::{Configuration, DynamicCommand};
//! use serde_json::json;
//!
//! let config = Configuration::from_documents(None, Some(&json!({"lr": 0.1, "layers": [8]}))).unwrap();
//! let mut command = DynamicCommand::new(Command::new("train").no_binary_name(true));
//! config.append_to(&mut command).unwrap();
//!
//! let matches = command.try_get_matches_from(["--layers", "4", "4"]).unwrap();
//! let parsed = command.matches_to_flat(&matches);
//! assert_eq!(parsed["layers"], json!([4, 4]));
//! assert!(parsed.get("lr").is_none());
//! ```

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;

use crate::args::{ArgSpec, ArgumentSurface};
use crate::error::Result;
use crate::transcode::FlatMap;

/// A clap command that accepts generated parameter options.
#[derive(Debug, Clone, Default)]
pub struct DynamicCommand {
    command: Command,
    specs: Vec<ArgSpec>,
    reserved: Vec<String>,
}

impl DynamicCommand {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            specs: Vec::new(),
            reserved: Vec::new(),
        }
    }

    /// Marks ids owned by the surrounding CLI; generated options may not
    /// reuse them.
    pub fn reserve<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn into_command(self) -> Command {
        self.command
    }

    /// Options added through [`ArgumentSurface::add_argument`], in order.
    pub fn dynamic_args(&self) -> &[ArgSpec] {
        &self.specs
    }

    /// Parses `args` against a copy of the wrapped command.
    pub fn try_get_matches_from<I, T>(&self, args: I) -> std::result::Result<ArgMatches, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.command.clone().try_get_matches_from(args)
    }

    /// Collects the dynamic options present in `matches`, already cast.
    ///
    /// List options yield an array; every other option yields its single
    /// value.
    pub fn matches_to_flat(&self, matches: &ArgMatches) -> FlatMap {
        let mut flat = FlatMap::new();
        for spec in &self.specs {
            let Ok(Some(values)) = matches.try_get_many::<Value>(&spec.id) else {
                continue;
            };
            let mut values: Vec<Value> = values.cloned().collect();
            let value = if spec.multiple {
                Value::Array(values)
            } else {
                values.pop().unwrap_or(Value::Null)
            };
            flat.insert(spec.id.clone(), value);
        }
        flat
    }
}

impl ArgumentSurface for DynamicCommand {
    fn has_argument(&self, id: &str) -> bool {
        id == "help"
            || self.reserved.iter().any(|reserved| reserved == id)
            || self
                .command
                .get_arguments()
                .any(|arg| arg.get_id().as_str() == id || arg.get_long() == Some(id))
    }

    fn add_argument(&mut self, spec: ArgSpec) -> Result<()> {
        let command = std::mem::take(&mut self.command);
        self.command = command.arg(to_clap_arg(&spec));
        self.specs.push(spec);
        Ok(())
    }
}

fn to_clap_arg(spec: &ArgSpec) -> Arg {
    let parameter = spec.parameter().clone();
    let arg = Arg::new(spec.id.clone())
        .long(spec.long().to_string())
        .help(spec.help_text())
        .required(spec.required)
        .allow_negative_numbers(true)
        .action(ArgAction::Set)
        .value_parser(move |token: &str| parameter.cast_token(token).map_err(|err| err.to_string()));
    if spec.multiple {
        arg.num_args(1..).value_name("VALUE")
    } else {
        arg.num_args(1).value_name(spec.kind.as_str().to_ascii_uppercase())
    }
}
