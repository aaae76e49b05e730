use std::path::PathBuf;

/// A field type that cannot be mapped to any converter.
///
/// This is a programming error in the settings declaration, not a data error,
/// and is surfaced when a store is constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// No built-in, `FromStr` or synthesized converter exists for the type.
    #[error("unsupported type '{type_name}' for field '{field}': no converter can be built")]
    UnsupportedType {
        /// Name of the offending type
        type_name: &'static str,
        /// Dotted path of the field declaring the type
        field: String,
    },
}

/// Errors raised while converting a single value to or from text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// On-disk text could not be parsed into the declared type.
    #[error("cannot parse '{input}' as {type_name}: {details}")]
    Parse {
        /// Target type name
        type_name: &'static str,
        /// Raw text that failed to parse
        input: String,
        /// Parser error details
        details: String,
    },

    /// An in-memory value could not be rendered as text.
    #[error("cannot format {type_name}: {details}")]
    Format {
        /// Source type name
        type_name: &'static str,
        /// Formatter error details
        details: String,
    },

    /// The value handed to a converter was not of the converter's type.
    #[error("value is not a {expected}")]
    TypeMismatch {
        /// Type the converter is bound to
        expected: &'static str,
    },
}

/// Errors that can occur during configuration store operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings type declares a field that cannot be persisted.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Error occurred during file I/O operations
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// Error occurred while persisting configuration to disk
    #[error("failed to persist config to '{path}': {details}")]
    PersistenceError {
        /// Path where persistence failed
        path: PathBuf,
        /// Error details from the persistence operation
        details: String,
    },

    /// Failed to initialize file watcher
    #[error("failed to initialize file watcher for '{path}': {details}")]
    FileWatcherInitError {
        /// Directory that was to be watched
        path: PathBuf,
        /// File watcher initialization error details
        details: String,
    },

    /// Structured input rejected by the projection
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Errors raised when applying structured (UI-side) values to settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    /// The input was not a map of field names to values.
    #[error("structured settings must be an object, got {actual}")]
    NotAnObject {
        /// JSON kind that was supplied instead
        actual: &'static str,
    },

    /// A value could not be coerced to the field's declared kind.
    #[error("invalid value for '{key}': expected {expected}")]
    InvalidValue {
        /// Field key from the input
        key: String,
        /// Kind the field requires
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::IoError {
            path: path.into(),
            details: error.to_string(),
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::PersistenceError {
            path: path.into(),
            details: error.to_string(),
        }
    }
}
