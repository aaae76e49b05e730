//! `get`: print one setting.

use super::lookup;
use crate::{
    ChatCoreError, Result, cli::formatting::format_value, config::ChatCoreSettings,
    config_store::ConfigStore,
};

/// Prints the value of one visible setting.
///
/// # Errors
/// Returns `ChatCoreError::UnknownKey` if the key is unknown or hidden
pub fn run(store: &ConfigStore<ChatCoreSettings>, key: &str) -> Result<String> {
    let settings = store.to_structured();

    let (_, value) = lookup(&settings, key).ok_or_else(|| ChatCoreError::UnknownKey {
        key: key.to_string(),
    })?;

    Ok(format_value(value))
}
