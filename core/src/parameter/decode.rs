//! Definition-document decoding.
//!
//! Field presence and field types are checked against a per-kind table before
//! the struct is deserialized, so a malformed definition reports the exact
//! field, the offending value and the expected type instead of a generic
//! deserialization message.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::types::{
    BoolParameter, CategoricalParameter, FloatParameter, IntParameter, ListParameter,
    StrParameter, ValueType,
};
use super::{Parameter, ParameterKind};
use crate::error::ParameterError;

const TYPE_FIELD: &str = "parameter_type";

#[derive(Clone, Copy)]
enum FieldType {
    Str,
    Bool,
    Int,
    Float,
    StrList,
    List,
    ElementType,
}

impl FieldType {
    fn expected(self) -> &'static str {
        match self {
            Self::Str => "a string",
            Self::Bool => "a boolean",
            Self::Int => "an integer",
            Self::Float => "a number",
            Self::StrList => "a list of strings",
            Self::List => "a list",
            Self::ElementType => "an element type tag",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Str | Self::ElementType => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64(),
            Self::Float => value.is_number(),
            Self::StrList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::List => value.is_array(),
        }
    }
}

struct Field {
    name: &'static str,
    ty: FieldType,
    optional: bool,
}

const fn required(name: &'static str, ty: FieldType) -> Field {
    Field {
        name,
        ty,
        optional: false,
    }
}

const fn optional(name: &'static str, ty: FieldType) -> Field {
    Field {
        name,
        ty,
        optional: true,
    }
}

const COMMON: &[Field] = &[
    required("name", FieldType::Str),
    required("help", FieldType::Str),
    required("required", FieldType::Bool),
];

const BOOL_FIELDS: &[Field] = &[
    required("default", FieldType::Bool),
    optional("is_constant", FieldType::Bool),
];

const INT_FIELDS: &[Field] = &[
    optional("default", FieldType::Int),
    optional("distribution", FieldType::Str),
    optional("p1", FieldType::Int),
    optional("p2", FieldType::Int),
];

const FLOAT_FIELDS: &[Field] = &[
    optional("default", FieldType::Float),
    optional("distribution", FieldType::Str),
    optional("p1", FieldType::Float),
    optional("p2", FieldType::Float),
];

const STR_FIELDS: &[Field] = &[optional("default", FieldType::Str)];

const CATEGORICAL_FIELDS: &[Field] = &[
    required("default", FieldType::Str),
    required("options", FieldType::StrList),
];

const LIST_FIELDS: &[Field] = &[
    required("default", FieldType::List),
    required("value_type", FieldType::ElementType),
];

fn fields_for(kind: ParameterKind) -> &'static [Field] {
    match kind {
        ParameterKind::Bool => BOOL_FIELDS,
        ParameterKind::Int => INT_FIELDS,
        ParameterKind::Float => FLOAT_FIELDS,
        ParameterKind::Str => STR_FIELDS,
        ParameterKind::Categorical => CATEGORICAL_FIELDS,
        ParameterKind::List => LIST_FIELDS,
    }
}

pub(super) fn from_definition(definition: &Value) -> Result<Parameter, ParameterError> {
    let Some(map) = definition.as_object() else {
        return Err(ParameterError::InvalidField {
            field: "<definition>".to_string(),
            value: definition.to_string(),
            expected: "a mapping",
        });
    };
    let label = map
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    let tag = match map.get(TYPE_FIELD) {
        None => {
            return Err(ParameterError::MissingField {
                name: label,
                field: TYPE_FIELD.to_string(),
            });
        }
        Some(Value::String(tag)) => tag.as_str(),
        Some(other) => {
            return Err(ParameterError::InvalidField {
                field: TYPE_FIELD.to_string(),
                value: other.to_string(),
                expected: "a string",
            });
        }
    };
    let kind = ParameterKind::parse(tag)
        .ok_or_else(|| ParameterError::UnknownParameterType(tag.to_string()))?;

    let mut fields: Map<String, Value> = map.clone();
    fields.remove(TYPE_FIELD);
    check_fields(&label, &fields, kind)?;

    if kind == ParameterKind::List {
        if let Some(tag) = fields.get("value_type").and_then(Value::as_str) {
            if ValueType::parse(tag).is_none() {
                return Err(ParameterError::UnknownValueType {
                    name: label,
                    value_type: tag.to_string(),
                });
            }
        }
    }

    // Null optionals fall back to their serde defaults.
    fields.retain(|_, value| !value.is_null());
    let fields = Value::Object(fields);
    match kind {
        ParameterKind::Bool => deserialize::<BoolParameter>(fields, kind)?.build(),
        ParameterKind::Int => deserialize::<IntParameter>(fields, kind)?.build(),
        ParameterKind::Float => deserialize::<FloatParameter>(fields, kind)?.build(),
        ParameterKind::Str => deserialize::<StrParameter>(fields, kind)?.build(),
        ParameterKind::Categorical => deserialize::<CategoricalParameter>(fields, kind)?.build(),
        ParameterKind::List => deserialize::<ListParameter>(fields, kind)?.build(),
    }
}

fn check_fields(
    label: &str,
    fields: &Map<String, Value>,
    kind: ParameterKind,
) -> Result<(), ParameterError> {
    let declared: Vec<&Field> = COMMON.iter().chain(fields_for(kind)).collect();

    for key in fields.keys() {
        if !declared.iter().any(|field| field.name == key) {
            return Err(ParameterError::UnexpectedField {
                name: label.to_string(),
                field: key.clone(),
            });
        }
    }

    for field in declared {
        match fields.get(field.name) {
            None | Some(Value::Null) if field.optional => {}
            None => {
                return Err(ParameterError::MissingField {
                    name: label.to_string(),
                    field: field.name.to_string(),
                });
            }
            Some(value) if !field.ty.accepts(value) => {
                return Err(ParameterError::InvalidField {
                    field: field.name.to_string(),
                    value: value.to_string(),
                    expected: field.ty.expected(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn deserialize<T: DeserializeOwned>(fields: Value, kind: ParameterKind) -> Result<T, ParameterError> {
    serde_json::from_value(fields).map_err(|err| ParameterError::InvalidField {
        field: "<definition>".to_string(),
        value: err.to_string(),
        expected: kind_expectation(kind),
    })
}

fn kind_expectation(kind: ParameterKind) -> &'static str {
    match kind {
        ParameterKind::Bool => "a bool parameter definition",
        ParameterKind::Int => "an int parameter definition",
        ParameterKind::Float => "a float parameter definition",
        ParameterKind::Str => "a str parameter definition",
        ParameterKind::Categorical => "a categorical parameter definition",
        ParameterKind::List => "a list parameter definition",
    }
}
