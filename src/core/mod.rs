use thiserror::Error;

use crate::config_store::ConfigError;

/// Error types for the ChatCore settings tooling.
///
/// Wraps store errors together with the failures of the command line
/// front end.
#[derive(Error, Debug)]
pub enum ChatCoreError {
    /// Settings store error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structured value could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown key passed on the command line
    #[error("unknown setting '{key}'")]
    UnknownKey {
        /// Key as typed by the user
        key: String,
    },

    /// A value was given that the setting does not accept
    #[error("invalid value for '{key}': {details}")]
    InvalidValue {
        /// Key as typed by the user
        key: String,
        /// Why the value was rejected
        details: String,
    },
}

/// A specialized `Result` type for ChatCore operations.
///
/// This type alias simplifies error handling by defaulting the error type
/// to `ChatCoreError`.
pub type Result<T> = std::result::Result<T, ChatCoreError>;
