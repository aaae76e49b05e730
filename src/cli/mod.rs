//! Command-line interface for inspecting and editing ChatCore settings.
//!
//! Every command opens the settings store on the ChatCore settings file,
//! which creates the file with defaults on first use.

mod commands;
pub mod formatting;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use commands::{get, path, set, show, watch};

use crate::{
    Result,
    config::{ChatCoreSettings, ConfigPaths, SETTINGS_NAME},
    config_store::{ConfigStore, StoreOptions},
};

/// Command line arguments of `chatcore-settings`.
#[derive(Debug, Parser)]
#[command(name = "chatcore-settings")]
#[command(about = "Inspect and edit ChatCore settings")]
pub struct Cli {
    /// Directory holding settings.ini instead of the XDG config directory
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Subcommands of `chatcore-settings`.
#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print every visible setting
    Show {
        /// Print as a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Print one setting
    Get {
        /// Setting key, e.g. WebApp.Port
        key: String,
    },
    /// Change one setting and save
    Set {
        /// Setting key, e.g. WebApp.Port
        key: String,
        /// New value; JSON is accepted for lists, e.g. '["spam","eggs"]'
        value: String,
    },
    /// Print settings whenever the file is edited
    Watch {
        /// Key pattern with `*` wildcards
        #[arg(default_value = "*")]
        pattern: String,
        /// Print one JSON object per change
        #[arg(long)]
        json: bool,
    },
    /// Print the settings file path
    Path,
}

impl Cli {
    /// Directory of the settings file.
    ///
    /// # Errors
    /// Returns an error if no `--dir` was given and neither `XDG_CONFIG_HOME`
    /// nor `HOME` is set
    pub fn settings_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(ConfigPaths::config_dir()?),
        }
    }
}

/// Opens the ChatCore settings store in `dir`.
///
/// # Errors
/// Returns an error if the settings schema cannot be persisted
pub fn open_store(dir: &Path, watch: bool) -> Result<ConfigStore<ChatCoreSettings>> {
    let options = StoreOptions {
        watch,
        ..StoreOptions::default()
    };

    Ok(ConfigStore::with_options(
        ChatCoreSettings::default(),
        dir,
        SETTINGS_NAME,
        options,
    )?)
}

/// Runs a command against the settings in `dir` and returns its output.
///
/// `watch` prints as it goes and returns once interrupted.
///
/// # Errors
/// Returns an error if the store cannot be opened or the command fails
pub async fn execute(dir: &Path, command: &CliCommand) -> Result<String> {
    match command {
        CliCommand::Path => Ok(path::run(dir)),
        CliCommand::Show { json } => show::run(&open_store(dir, false)?, *json),
        CliCommand::Get { key } => get::run(&open_store(dir, false)?, key),
        CliCommand::Set { key, value } => set::run(&open_store(dir, false)?, key, value),
        CliCommand::Watch { pattern, json } => {
            watch::run(&open_store(dir, true)?, pattern, *json).await?;
            Ok(String::new())
        }
    }
}
