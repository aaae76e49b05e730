//! `set`: change one setting and save.

use serde_json::{Map, Value};
use tracing::info;

use super::{canonical_key, lookup};
use crate::{
    ChatCoreError, Result,
    cli::formatting::{format_key, format_value},
    config::ChatCoreSettings,
    config_store::{ConfigError, ConfigStore, ProjectionError},
};

/// Assigns one visible setting from command line text and saves.
///
/// The text is read as JSON when it parses as an array, otherwise as a
/// plain string coerced to the setting's type.
///
/// # Errors
/// Returns `ChatCoreError::UnknownKey` for unknown or hidden keys and
/// `ChatCoreError::InvalidValue` if the text cannot be coerced
pub fn run(store: &ConfigStore<ChatCoreSettings>, key: &str, text: &str) -> Result<String> {
    let unknown = || ChatCoreError::UnknownKey {
        key: key.to_string(),
    };

    if lookup(&store.to_structured(), key).is_none() {
        return Err(unknown());
    }
    let key = canonical_key(key);

    let value = match serde_json::from_str::<Value>(text) {
        Ok(array @ Value::Array(_)) => array,
        _ => Value::String(text.to_string()),
    };

    let mut input = Map::new();
    input.insert(key.clone(), value);

    let report = store
        .apply_from_structured(&Value::Object(input))
        .map_err(|e| match e {
            ConfigError::Projection(ProjectionError::InvalidValue { expected, .. }) => {
                ChatCoreError::InvalidValue {
                    key: key.clone(),
                    details: format!("expected {expected}"),
                }
            }
            other => other.into(),
        })?;

    if !report.applied.contains(&key) {
        return Err(ChatCoreError::InvalidValue {
            key,
            details: format!("'{text}' is not an accepted value"),
        });
    }

    info!(key = %key, "Setting updated");

    let settings = store.to_structured();
    let (key, value) = lookup(&settings, &key).ok_or_else(unknown)?;
    Ok(format!("{} = {}", format_key(&key), format_value(value)))
}
