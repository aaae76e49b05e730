use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use super::ConfigError;

/// Primary, backup and temporary paths of one settings file.
///
/// All three live in the same directory so renames between them stay on one
/// file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFile {
    primary: PathBuf,
    backup: PathBuf,
    temp: PathBuf,
}

impl PersistedFile {
    /// Paths for `<directory>/<name>.ini` and its `.bak`/`.tmp` sidecars.
    pub fn new(directory: impl AsRef<Path>, name: &str) -> Self {
        Self::from_primary(directory.as_ref().join(format!("{name}.ini")))
    }

    /// Paths derived from an explicit primary file path.
    pub fn from_primary(primary: PathBuf) -> Self {
        let with_suffix = |suffix: &str| {
            let mut path = OsString::from(primary.as_os_str());
            path.push(suffix);
            PathBuf::from(path)
        };

        Self {
            backup: with_suffix(".bak"),
            temp: with_suffix(".tmp"),
            primary,
        }
    }

    /// The settings file itself.
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    /// Previous good copy, kept while a new one is moved into place.
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Staging file for the next write.
    pub fn temp(&self) -> &Path {
        &self.temp
    }

    /// Directory containing all three files.
    pub fn directory(&self) -> &Path {
        self.primary
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Moves the backup into place when the primary is missing, which only
    /// happens if a previous write stopped between its two renames.
    ///
    /// Returns whether a backup was promoted.
    ///
    /// # Errors
    /// Returns `ConfigError::IoError` if the rename fails.
    pub fn promote_backup(&self) -> Result<bool, ConfigError> {
        if self.primary.exists() || !self.backup.exists() {
            return Ok(false);
        }

        fs::rename(&self.backup, &self.primary).map_err(|e| ConfigError::io(&self.backup, e))?;
        info!(path = %self.primary.display(), "Recovered settings file from backup");
        Ok(true)
    }

    /// Reads the primary file, `None` if it does not exist.
    ///
    /// # Errors
    /// Returns `ConfigError::IoError` for any failure other than a missing file.
    pub fn read(&self) -> Result<Option<String>, ConfigError> {
        match fs::read_to_string(&self.primary) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::io(&self.primary, e)),
        }
    }

    /// Replaces the primary file with `contents`.
    ///
    /// The document is written to the temp path first; the existing primary
    /// then becomes the backup and the temp file is renamed into place.
    ///
    /// # Errors
    /// Returns `ConfigError::PersistenceError` if any step fails. The
    /// previous primary or its backup is left intact.
    pub fn write_atomically(&self, contents: &str) -> Result<(), ConfigError> {
        fs::create_dir_all(self.directory())
            .map_err(|e| ConfigError::persistence(self.directory(), e))?;

        fs::write(&self.temp, contents).map_err(|e| ConfigError::persistence(&self.temp, e))?;

        if self.primary.exists() {
            if self.backup.exists() {
                fs::remove_file(&self.backup)
                    .map_err(|e| ConfigError::persistence(&self.backup, e))?;
            }
            fs::rename(&self.primary, &self.backup)
                .map_err(|e| ConfigError::persistence(&self.primary, e))?;
        }

        fs::rename(&self.temp, &self.primary)
            .map_err(|e| ConfigError::persistence(&self.primary, e))?;

        debug!(path = %self.primary.display(), bytes = contents.len(), "Wrote settings file");
        Ok(())
    }
}
