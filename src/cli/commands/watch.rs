//! `watch`: follow external edits of the settings file.

use futures::StreamExt;
use serde_json::{Map, Value, json};
use tracing::info;

use super::lookup;
use crate::{
    Result,
    cli::formatting::{format_description, format_key, format_value},
    config::ChatCoreSettings,
    config_store::{ConfigChange, ConfigStore},
};

/// Prints changed settings until Ctrl+C is pressed.
///
/// # Errors
/// Returns an error if waiting for Ctrl+C fails or a change cannot be
/// encoded as JSON
pub async fn run(store: &ConfigStore<ChatCoreSettings>, pattern: &str, json: bool) -> Result<()> {
    if !store.is_watching() {
        println!("{}", format_description("File watching is unavailable on this system"));
        return Ok(());
    }

    if !json {
        println!("Watching '{}' in {}", pattern, store.path().display());
        println!("{}", format_description("Press Ctrl+C to stop"));
    }

    let mut changes = Box::pin(store.subscribe_to_key(pattern));

    loop {
        tokio::select! {
            change = changes.next() => match change {
                Some(change) if json => println!("{}", serde_json::to_string(&to_json(store, &change))?),
                Some(change) => println!("{}", describe(store, &change)),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    info!("Stopped watching settings");
    store.close();
    Ok(())
}

/// One line per changed key with its new value.
pub fn describe(store: &ConfigStore<ChatCoreSettings>, change: &ConfigChange) -> String {
    let settings = store.to_structured();

    change
        .keys
        .iter()
        .map(|key| match lookup(&settings, key) {
            Some((key, value)) => format!("{} = {}", format_key(&key), format_value(value)),
            None => format!("{} {}", format_key(key), format_description("(hidden)")),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Change as a JSON object with the new values of visible changed keys.
pub fn to_json(store: &ConfigStore<ChatCoreSettings>, change: &ConfigChange) -> Value {
    let settings = store.to_structured();

    let values: Map<String, Value> = change
        .keys
        .iter()
        .filter_map(|key| lookup(&settings, key))
        .map(|(key, value)| (key, value.clone()))
        .collect();

    json!({
        "source": change.source,
        "keys": change.keys,
        "rejected": change.rejected,
        "values": values,
    })
}
