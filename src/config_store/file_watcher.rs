use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
    recommended_watcher,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::ConfigError;

/// A file system event for the watched settings file.
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// The path of the file that changed
    pub path: PathBuf,
    /// The type of change that occurred
    pub kind: FileEventKind,
}

/// The type of file system change that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File contents were written or a file was renamed onto the path
    Modified,
    /// File was created
    Created,
}

impl FileEventKind {
    /// Content-changing events only; metadata, access, removal and
    /// rename-away events are dropped.
    fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Watches the directory of one file and reports changes to that file.
///
/// Events are delivered on a dedicated thread. Queued events are drained
/// before the handler runs, so a burst of writes produces one call.
/// Dropping the monitor stops delivery.
pub struct ChangeMonitor {
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

impl ChangeMonitor {
    /// Starts watching `file` and invokes `on_change` for each batch of
    /// content changes.
    ///
    /// # Errors
    /// Returns `ConfigError::FileWatcherInitError` if the watcher cannot be
    /// created or the directory cannot be watched.
    pub fn start<F>(file: &Path, on_change: F) -> Result<Self, ConfigError>
    where
        F: Fn(FileEvent) + Send + 'static,
    {
        let directory = file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let file_name: OsString = file
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| ConfigError::FileWatcherInitError {
                path: file.to_path_buf(),
                details: "path has no file name".to_string(),
            })?;

        let init_error = |e: &dyn std::fmt::Display| ConfigError::FileWatcherInitError {
            path: directory.clone(),
            details: e.to_string(),
        };

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("File watcher error: {e}");
                    return;
                }
            };

            let Some(kind) = FileEventKind::from_notify(&event.kind) else {
                return;
            };

            for path in event.paths {
                if path.file_name() == Some(file_name.as_os_str()) {
                    let _ = event_tx.send(FileEvent { path, kind });
                }
            }
        })
        .map_err(|e| init_error(&e))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| init_error(&e))?;

        let worker = thread::Builder::new()
            .name("config-monitor".to_string())
            .spawn(move || {
                while let Some(mut event) = event_rx.blocking_recv() {
                    while let Ok(next) = event_rx.try_recv() {
                        event = next;
                    }
                    debug!(path = %event.path.display(), kind = ?event.kind, "Settings file changed");
                    on_change(event);
                }
            })
            .map_err(|e| init_error(&e))?;

        debug!(directory = %directory.display(), "Change monitor started");

        Ok(Self {
            watcher: Some(watcher),
            worker: Some(worker),
        })
    }

    /// Stops watching and waits for the delivery thread to finish its
    /// current handler.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the watcher drops the event sender, which ends the worker loop.
        self.watcher.take();

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl Drop for ChangeMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
