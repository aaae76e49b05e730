//! Generic map view of a settings object for non-text consumers such as a
//! settings page.
//!
//! Only simple kinds are projected: booleans, numbers, strings, enumeration
//! names and string lists. Hidden fields and every other kind are omitted.

use std::any::Any;

use serde_json::{Map, Value};
use tracing::debug;

use super::{
    BoxedValue, ProjectionError,
    converters::{normalize_list, parse_bool},
    schema::{FieldSpec, Settings, TypeKind},
    tokenizer::{field_to_key, key_to_field},
};

/// Outcome of applying a structured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    /// Keys whose values were assigned
    pub applied: Vec<String>,
    /// Keys that matched no field, named hidden-kind fields, or held an
    /// unknown enumeration name
    pub ignored: Vec<String>,
}

/// Projects every visible field of `settings` keyed by its on-disk key.
pub fn to_structured<S: Settings>(settings: &S) -> Map<String, Value> {
    let schema = S::schema();

    schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.hidden)
        .filter_map(|(index, field)| {
            let value = settings.field(index)?;
            let projected = project(field, value)?;
            Some((field_to_key(field.name), projected))
        })
        .collect()
}

fn project(field: &FieldSpec, value: &dyn Any) -> Option<Value> {
    match field.ty.kind {
        TypeKind::String => value.downcast_ref::<String>().cloned().map(Value::String),
        TypeKind::Bool => value.downcast_ref::<bool>().copied().map(Value::Bool),
        TypeKind::Number(ops) => (ops.to_json)(value).map(Value::Number),
        TypeKind::Enum(ops) => (ops.name_of)(value).map(|name| Value::String(name.to_string())),
        TypeKind::StringList => value
            .downcast_ref::<Vec<String>>()
            .map(|items| Value::Array(items.iter().cloned().map(Value::String).collect())),
        TypeKind::Timestamp | TypeKind::Parsed(_) | TypeKind::Composite(_) | TypeKind::Opaque => {
            None
        }
    }
}

enum Coerced {
    Value(BoxedValue),
    Skip,
}

/// Assigns values from a structured map onto `settings`.
///
/// Keys may be written in on-disk form (`WebApp.Port`) or field form
/// (`WebApp_Port`). Unknown keys and unknown enumeration names are ignored.
/// Any other value that cannot be coerced rejects the whole input and
/// leaves `settings` untouched.
///
/// # Errors
/// Returns `ProjectionError::NotAnObject` if `input` is not a map, or
/// `ProjectionError::InvalidValue` naming the first offending key.
pub fn apply_from_structured<S: Settings>(
    settings: &mut S,
    input: &Value,
) -> Result<ProjectionReport, ProjectionError> {
    let Value::Object(map) = input else {
        return Err(ProjectionError::NotAnObject {
            actual: json_kind(input),
        });
    };

    let schema = S::schema();
    let mut report = ProjectionReport::default();
    let mut pending = Vec::new();

    for (key, value) in map {
        let Some(index) = schema.position(&key_to_field(key)) else {
            report.ignored.push(key.clone());
            continue;
        };
        let field = &schema.fields()[index];

        match coerce(field, value) {
            Ok(Coerced::Value(boxed)) => pending.push((key, index, boxed)),
            Ok(Coerced::Skip) => {
                debug!(key = %key, "Ignoring structured value");
                report.ignored.push(key.clone());
            }
            Err(expected) => {
                return Err(ProjectionError::InvalidValue {
                    key: key.clone(),
                    expected,
                });
            }
        }
    }

    for (key, index, boxed) in pending {
        let field = &schema.fields()[index];
        let assigned = settings
            .field_mut(index)
            .is_some_and(|slot| (field.ty.assign)(slot, boxed));

        if assigned {
            report.applied.push(key.clone());
        } else {
            report.ignored.push(key.clone());
        }
    }

    Ok(report)
}

fn coerce(field: &FieldSpec, value: &Value) -> Result<Coerced, &'static str> {
    let expected = field.ty.kind.label();

    let boxed: BoxedValue = match (field.ty.kind, value) {
        (TypeKind::Bool, Value::Bool(b)) => Box::new(*b),
        (TypeKind::Bool, Value::String(s)) => Box::new(parse_bool(s.trim())),
        (TypeKind::Bool, Value::Number(n)) => Box::new(n.as_f64().is_some_and(|n| n != 0.0)),

        (TypeKind::Number(ops), Value::Number(n)) => (ops.from_json)(n).ok_or(expected)?,
        (TypeKind::Number(ops), Value::String(s)) => {
            (ops.text.parse)(s.trim()).map_err(|_| expected)?
        }

        (TypeKind::String, Value::String(s)) => Box::new(s.clone()),
        (TypeKind::String, Value::Bool(_) | Value::Number(_)) => Box::new(value.to_string()),

        (TypeKind::Enum(ops), Value::String(name)) => match (ops.from_name)(name) {
            Some(variant) => variant,
            None => return Ok(Coerced::Skip),
        },
        (TypeKind::Enum(_), _) => return Ok(Coerced::Skip),

        (TypeKind::StringList, Value::Array(items)) => {
            let items = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.as_str()),
                    _ => Err(expected),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Box::new(normalize_list(&items.join(",")))
        }
        (TypeKind::StringList, Value::String(s)) => Box::new(normalize_list(s)),

        (TypeKind::Timestamp | TypeKind::Parsed(_) | TypeKind::Composite(_) | TypeKind::Opaque, _) => {
            return Ok(Coerced::Skip);
        }

        _ => return Err(expected),
    };

    Ok(Coerced::Value(boxed))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
