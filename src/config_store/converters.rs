use std::{any::Any, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{
    ConvertError,
    schema::{BoxedValue, CompositeOps, EnumOps, ParseOps},
};

/// A parse/format function pair bound to one value type.
pub trait Converter: Send + Sync {
    /// Converts on-disk text into a value of the bound type.
    ///
    /// # Errors
    /// Returns `ConvertError::Parse` if the text is not a valid value.
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError>;

    /// Renders a value of the bound type as on-disk text.
    ///
    /// # Errors
    /// Returns `ConvertError::TypeMismatch` for a value of another type and
    /// `ConvertError::Format` if the value has no textual form.
    fn format(&self, value: &dyn Any) -> Result<String, ConvertError>;
}

/// Ticks of 100ns between 1601-01-01 and the Unix epoch.
const FILETIME_UNIX_OFFSET: i64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

fn downcast<'a, T: 'static>(value: &'a dyn Any, expected: &'static str) -> Result<&'a T, ConvertError> {
    value
        .downcast_ref::<T>()
        .ok_or(ConvertError::TypeMismatch { expected })
}

fn dequote(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

pub(crate) fn is_braced(text: &str) -> bool {
    text.starts_with('{') && text.ends_with('}')
}

pub(crate) fn parse_bool(text: &str) -> bool {
    text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("on") || text == "1"
}

/// Lower-cases, strips whitespace and trailing commas, and drops empty items.
pub(crate) fn normalize_list(text: &str) -> Vec<String> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    compact
        .trim_end_matches(',')
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strings are quoted, except brace-delimited text which is written as is.
pub struct StringConverter;

impl Converter for StringConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        Ok(Box::new(dequote(text).to_string()))
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        let value = downcast::<String>(value, "String")?;
        if is_braced(value) {
            return Ok(value.clone());
        }
        Ok(format!("\"{value}\""))
    }
}

/// `true`, `on` and `1` (any case) are true, everything else is false.
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        Ok(Box::new(parse_bool(text)))
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        downcast::<bool>(value, "bool").map(ToString::to_string)
    }
}

/// Enumerations by exact variant name.
pub struct EnumConverter {
    pub(crate) type_name: &'static str,
    pub(crate) ops: EnumOps,
}

impl Converter for EnumConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        (self.ops.from_name)(text).ok_or_else(|| ConvertError::Parse {
            type_name: self.type_name,
            input: text.to_string(),
            details: format!("expected one of {}", (self.ops.names)().join(", ")),
        })
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        (self.ops.name_of)(value)
            .map(str::to_string)
            .ok_or(ConvertError::TypeMismatch {
                expected: self.type_name,
            })
    }
}

/// UTC timestamps as a count of 100ns intervals since 1601-01-01.
pub struct TimestampConverter;

impl Converter for TimestampConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        let parse_error = |details: String| ConvertError::Parse {
            type_name: "DateTime<Utc>",
            input: text.to_string(),
            details,
        };

        let ticks: i64 = text.parse().map_err(|e| parse_error(format!("{e}")))?;
        if ticks < 0 {
            return Err(parse_error("file time cannot be negative".to_string()));
        }

        let unix_ticks = ticks - FILETIME_UNIX_OFFSET;
        let seconds = unix_ticks.div_euclid(TICKS_PER_SECOND);
        let nanos = u32::try_from(unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100)
            .map_err(|e| parse_error(e.to_string()))?;

        DateTime::<Utc>::from_timestamp(seconds, nanos)
            .map(|timestamp| Box::new(timestamp) as BoxedValue)
            .ok_or_else(|| parse_error("timestamp out of range".to_string()))
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        let timestamp = downcast::<DateTime<Utc>>(value, "DateTime<Utc>")?;

        timestamp
            .timestamp()
            .checked_mul(TICKS_PER_SECOND)
            .and_then(|ticks| ticks.checked_add(i64::from(timestamp.timestamp_subsec_nanos() / 100)))
            .and_then(|ticks| ticks.checked_add(FILETIME_UNIX_OFFSET))
            .filter(|ticks| *ticks >= 0)
            .map(|ticks| ticks.to_string())
            .ok_or_else(|| ConvertError::Format {
                type_name: "DateTime<Utc>",
                details: format!("{timestamp} is not representable as a file time"),
            })
    }
}

/// Comma separated, lower-cased, quoted string lists.
pub struct StringListConverter;

impl Converter for StringListConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        Ok(Box::new(normalize_list(dequote(text))))
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        let items = downcast::<Vec<String>>(value, "Vec<String>")?;
        Ok(format!("\"{}\"", normalize_list(&items.join(",")).join(",")))
    }
}

/// Types converted through `FromStr` and `Display`.
pub struct FromStrConverter {
    pub(crate) type_name: &'static str,
    pub(crate) ops: ParseOps,
}

impl Converter for FromStrConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        (self.ops.parse)(text).map_err(|details| ConvertError::Parse {
            type_name: self.type_name,
            input: text.to_string(),
            details,
        })
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        (self.ops.format)(value).ok_or(ConvertError::TypeMismatch {
            expected: self.type_name,
        })
    }
}

/// One member of a synthesized composite converter.
pub(crate) struct SubField {
    pub(crate) name: &'static str,
    pub(crate) index: usize,
    pub(crate) assign: fn(&mut dyn Any, BoxedValue) -> bool,
    pub(crate) converter: Arc<dyn Converter>,
}

/// Converter synthesized for a nested settings aggregate.
///
/// Values are written as a JSON object mapping each sub-field name to its
/// own formatted text.
pub struct CompositeConverter {
    pub(crate) type_name: &'static str,
    pub(crate) ops: CompositeOps,
    pub(crate) fields: Vec<SubField>,
}

impl Converter for CompositeConverter {
    fn parse(&self, text: &str) -> Result<BoxedValue, ConvertError> {
        let parse_error = |details: String| ConvertError::Parse {
            type_name: self.type_name,
            input: text.to_string(),
            details,
        };

        let blob: Map<String, Value> =
            serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        let mut instance = (self.ops.new)();

        for sub in &self.fields {
            let Some(raw) = blob.get(sub.name) else {
                continue;
            };
            let raw = match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };

            let value = sub.converter.parse(&raw)?;
            let slot = (self.ops.field_mut)(&mut *instance, sub.index)
                .ok_or_else(|| parse_error(format!("missing field '{}'", sub.name)))?;
            if !(sub.assign)(slot, value) {
                return Err(parse_error(format!("type mismatch on field '{}'", sub.name)));
            }
        }

        Ok(instance)
    }

    fn format(&self, value: &dyn Any) -> Result<String, ConvertError> {
        let mut blob = Map::new();

        for sub in &self.fields {
            let field = (self.ops.field)(value, sub.index).ok_or(ConvertError::TypeMismatch {
                expected: self.type_name,
            })?;
            blob.insert(sub.name.to_string(), Value::String(sub.converter.format(field)?));
        }

        serde_json::to_string(&blob).map_err(|e| ConvertError::Format {
            type_name: self.type_name,
            details: e.to_string(),
        })
    }
}
