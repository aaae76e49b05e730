//! `path`: print where the settings file lives.

use std::path::Path;

use crate::{config::SETTINGS_NAME, config_store::PersistedFile};

/// Prints the settings file path without opening the store.
pub fn run(dir: &Path) -> String {
    PersistedFile::new(dir, SETTINGS_NAME)
        .primary()
        .display()
        .to_string()
}
