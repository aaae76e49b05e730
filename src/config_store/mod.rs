//! Persistent settings store with hot reload.
//!
//! Maps a typed settings object to a human-editable `.ini`-style file.
//! Writes are atomic (temp file, backup, rename), user comments and sections
//! survive rewrites, and edits made by other programs are loaded back while
//! the store is open. Field types are converted through a registry that
//! synthesizes converters for nested settings aggregates.

mod changes;
mod converters;
mod error;
mod file_watcher;
mod macros;
mod path_ops;
mod persisted_file;
mod projection;
mod registry;
mod schema;
mod serializer;
mod store;
mod tokenizer;

#[cfg(test)]
mod tests;

pub use changes::{ChangeSource, ConfigChange};
pub use converters::{
    BoolConverter, CompositeConverter, Converter, EnumConverter, FromStrConverter,
    StringConverter, StringListConverter, TimestampConverter,
};
pub use error::{ConfigError, ConvertError, ProjectionError, SchemaError};
pub use file_watcher::{ChangeMonitor, FileEvent, FileEventKind};
pub use persisted_file::PersistedFile;
pub use projection::{ProjectionReport, apply_from_structured, to_structured};
pub use registry::ConverterRegistry;
pub use schema::{
    BoxedValue, ConfigEnum, ConfigType, FieldSpec, Schema, Settings, TypeDescriptor, TypeKind,
};
pub use serializer::{LoadReport, SettingsSerializer};
pub use store::{ConfigStore, DEFAULT_RETRY_DELAY, StoreOptions};
pub use tokenizer::{Entry, Token, field_to_key, key_to_field, tokenize};
