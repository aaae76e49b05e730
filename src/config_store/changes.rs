use std::time::Instant;

use serde::Serialize;

use super::LoadReport;

/// What caused a reload of the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// Another program edited the file
    FileEdit,
    /// The store's own save, reported only when saves trigger reloads
    Save,
}

/// Notification sent to subscribers after the settings file was reloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChange {
    /// What caused the reload.
    pub source: ChangeSource,
    /// On-disk keys whose values were assigned, in document order.
    pub keys: Vec<String>,
    /// Keys present in the file that could not be parsed.
    pub rejected: Vec<String>,
    /// Timestamp when the reload completed.
    pub timestamp: Instant,
}

impl ConfigChange {
    /// Creates a change notification from the outcome of a reload.
    pub fn new(source: ChangeSource, report: LoadReport) -> Self {
        Self {
            source,
            keys: report.applied,
            rejected: report.rejected,
            timestamp: Instant::now(),
        }
    }

    /// Whether the reload assigned the given on-disk key.
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|candidate| candidate == key)
    }
}
