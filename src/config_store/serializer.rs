use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};

use super::{
    registry::ConverterRegistry,
    schema::Settings,
    tokenizer::{Token, field_to_key, key_to_field, tokenize},
};

/// Outcome of applying a document to a settings object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Keys whose values were assigned
    pub applied: Vec<String>,
    /// Keys with no matching field in the current schema
    pub unknown: Vec<String>,
    /// Keys whose values could not be converted; the field kept its value
    pub rejected: Vec<String>,
}

/// Renders settings objects as documents and applies documents back onto
/// them, remembering user comments between the two.
pub struct SettingsSerializer {
    registry: Arc<ConverterRegistry>,
    comments: HashMap<String, String>,
}

impl SettingsSerializer {
    /// Creates a serializer resolving converters through `registry`.
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self {
            registry,
            comments: HashMap::new(),
        }
    }

    /// Last comment seen in a document for an on-disk key.
    pub fn comment(&self, key: &str) -> Option<&str> {
        self.comments.get(key).map(String::as_str)
    }

    /// Assigns every recognised entry of `text` onto `settings`.
    ///
    /// Unknown keys are skipped and values that fail to parse leave the field
    /// untouched. Comments are remembered even for entries without a value.
    pub fn apply<S: Settings>(&mut self, settings: &mut S, text: &str) -> LoadReport {
        let schema = S::schema();
        let mut report = LoadReport::default();

        for token in tokenize(text) {
            let Token::Entry(entry) = token else {
                continue;
            };

            if let Some(comment) = entry.comment {
                self.comments.insert(entry.key.clone(), comment);
            }

            let Some(raw) = entry.value else {
                continue;
            };

            let Some(index) = schema.position(&key_to_field(&entry.key)) else {
                debug!(key = %entry.key, "Skipping key with no matching field");
                report.unknown.push(entry.key);
                continue;
            };
            let field = &schema.fields()[index];

            let parsed = self
                .registry
                .converter_for_field(field)
                .map_err(|e| e.to_string())
                .and_then(|converter| converter.parse(&raw).map_err(|e| e.to_string()));

            let value = match parsed {
                Ok(value) => value,
                Err(e) => {
                    warn!(key = %entry.key, value = %raw, "Failed to parse field: {e}");
                    report.rejected.push(entry.key);
                    continue;
                }
            };

            let assigned = settings
                .field_mut(index)
                .is_some_and(|slot| (field.ty.assign)(slot, value));

            if assigned {
                report.applied.push(entry.key);
            } else {
                warn!(key = %entry.key, "Parsed value does not match field type {}", field.ty.name);
                report.rejected.push(entry.key);
            }
        }

        report
    }

    /// Renders `settings` as a complete document.
    ///
    /// A field whose value cannot be formatted is still written, with an
    /// empty value, so the key is not lost from the file.
    pub fn render<S: Settings>(&self, settings: &S) -> String {
        let schema = S::schema();
        let mut lines: Vec<String> = Vec::new();

        for line in schema.header_lines() {
            if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("// {line}"));
            }
        }

        let mut current_section = None;

        for (index, field) in schema.fields().iter().enumerate() {
            if let Some(section) = field.section {
                if current_section != Some(section) {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(format!("[{section}]"));
                    current_section = Some(section);
                }
            }

            let key = field_to_key(field.name);

            let formatted = self
                .registry
                .converter_for_field(field)
                .map_err(|e| e.to_string())
                .and_then(|converter| {
                    let value = settings
                        .field(index)
                        .ok_or_else(|| format!("field '{}' is not readable", field.name))?;
                    converter.format(value).map_err(|e| e.to_string())
                });

            let value = formatted.unwrap_or_else(|e| {
                warn!(key = %key, "Failed to format field: {e}");
                String::new()
            });

            let comment = match self.comments.get(&key) {
                Some(user) => format!(" //{user}"),
                None => field
                    .comment
                    .map(|default| format!(" // {default}"))
                    .unwrap_or_default(),
            };

            lines.push(format!("{key}={value}{comment}"));
        }

        let mut document = lines.join("\n");
        document.push('\n');
        document
    }
}
