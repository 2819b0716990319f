//! Structural validation of a JSON body against a descriptor.
//!
//! The check is coarse and shallow: only top-level keys are inspected, all
//! numbers are alike, and nothing is decoded.

use serde_json::{Map, Value};

use super::descriptor::{JsonType, TargetDescriptor};
use crate::error::{LocatedError, Location};

/// Reports unknown keys and coarse type mismatches, in key order.
pub(crate) fn validate_structure<T>(
    body: &Map<String, Value>,
    descriptor: &TargetDescriptor<T>,
) -> Vec<LocatedError> {
    let mut errors = Vec::new();

    for (key, value) in body {
        let Some(expected) = descriptor.json_field(key).and_then(|field| field.json_type()) else {
            errors.push(LocatedError::new(Location::Field(key.clone()), "unknown field"));
            continue;
        };

        if !accepts(expected, value) {
            errors.push(LocatedError::new(
                Location::Field(key.clone()),
                format!("expected {expected} but got {}", value_type(value)),
            ));
        }
    }

    errors
}

/// Names the runtime type of a JSON value.
pub(crate) fn value_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

fn accepts(expected: JsonType, value: &Value) -> bool {
    match expected {
        JsonType::String => value.is_string(),
        JsonType::Number => value.is_number(),
        JsonType::Boolean => value.is_boolean(),
        JsonType::Array => value.is_array(),
        JsonType::Object => value.is_object(),
        JsonType::Any => true,
    }
}
