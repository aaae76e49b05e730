//! `show`: list visible settings.

use crate::{
    Result,
    cli::formatting::{format_header, format_key, format_value},
    config::ChatCoreSettings,
    config_store::ConfigStore,
};

/// Lists every visible setting, one `key = value` per line.
///
/// # Errors
/// Returns an error if JSON output cannot be encoded
pub fn run(store: &ConfigStore<ChatCoreSettings>, json: bool) -> Result<String> {
    let settings = store.to_structured();

    if json {
        return Ok(serde_json::to_string_pretty(&settings)?);
    }

    let mut lines = vec![format_header(&store.path().display().to_string())];
    lines.extend(
        settings
            .iter()
            .map(|(key, value)| format!("{} = {}", format_key(key), format_value(value))),
    );

    Ok(lines.join("\n"))
}
