//! ChatCore - settings persistence for a multi-platform live chat aggregator.
//!
//! The [`config_store`] module maps a typed settings object to a
//! human-editable `.ini`-style file with atomic writes, comment and section
//! preservation, and hot reload on external edits. The [`config`] module
//! holds the settings shared by the platform connectors.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chatcore::{config::{ChatCoreSettings, SETTINGS_NAME}, config_store::ConfigStore};
//!
//! let store = ConfigStore::new(ChatCoreSettings::default(), "/tmp/chatcore", SETTINGS_NAME)?;
//!
//! store.on_config_changed(|settings| println!("Port is now {}", settings.web_app_port));
//! store.update(|settings| settings.volume = 0.5);
//! store.save()?;
//! # Ok::<(), chatcore::config_store::ConfigError>(())
//! ```

/// ChatCore settings definitions and paths.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Persistent settings store with hot reload.
pub mod config_store;

/// Command-line interface for settings management.
pub mod cli;

/// Logging initialization.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use crate::core::{ChatCoreError, Result};
