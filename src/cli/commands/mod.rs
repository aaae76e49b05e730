//! Command implementations, one module per subcommand.

pub mod get;
pub mod path;
pub mod set;
pub mod show;
pub mod watch;

use serde_json::{Map, Value};

use crate::config_store::{field_to_key, key_to_field};

/// On-disk form of a key typed as either `WebApp.Port` or `WebApp_Port`.
pub(crate) fn canonical_key(key: &str) -> String {
    field_to_key(&key_to_field(key.trim()))
}

/// Looks a key up in the structured view.
pub(crate) fn lookup<'a>(settings: &'a Map<String, Value>, key: &str) -> Option<(String, &'a Value)> {
    let key = canonical_key(key);
    let value = settings.get(&key)?;
    Some((key, value))
}
