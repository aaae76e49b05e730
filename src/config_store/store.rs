use std::{
    path::Path,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use futures::Stream;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use super::{
    ChangeSource, ConfigChange, ConfigError, LoadReport, PersistedFile, ProjectionReport,
    file_watcher::{ChangeMonitor, FileEvent},
    path_ops::path_matches,
    projection,
    registry::ConverterRegistry,
    schema::Settings,
    serializer::SettingsSerializer,
};

/// Delay before the single retry of a failed save.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

type ChangeListener<S> = Arc<dyn Fn(&S) + Send + Sync>;
type Fingerprint = [u8; 32];

/// Construction options for a [`ConfigStore`].
#[derive(Clone)]
pub struct StoreOptions {
    /// Reload and notify listeners after the store's own saves too
    pub save_triggers_reload: bool,
    /// Watch the file for external edits
    pub watch: bool,
    /// Delay before retrying a failed save
    pub retry_delay: Duration,
    /// Converter registry used for load, save and projection
    pub registry: Arc<ConverterRegistry>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            save_triggers_reload: false,
            watch: true,
            retry_delay: DEFAULT_RETRY_DELAY,
            registry: Arc::new(ConverterRegistry::new()),
        }
    }
}

/// Persists one settings object to a human-editable file and keeps it in
/// sync with external edits.
///
/// Construction loads the file (recovering from a leftover backup), then
/// saves unconditionally so fields added since the file was written appear
/// in it. While the store is open, edits made to the file by other programs
/// are loaded back and reported to listeners. Close the store (or drop it)
/// to stop watching.
pub struct ConfigStore<S: Settings> {
    inner: Arc<StoreInner<S>>,
    monitor: Mutex<Option<ChangeMonitor>>,
}

struct StoreInner<S: Settings> {
    file: PersistedFile,
    settings: Arc<RwLock<S>>,
    serializer: Mutex<SettingsSerializer>,
    saving: AtomicBool,
    last_written: Mutex<Option<Fingerprint>>,
    save_triggers_reload: bool,
    retry_delay: Duration,
    listeners: RwLock<Vec<ChangeListener<S>>>,
    change_sender: broadcast::Sender<ConfigChange>,
}

impl<S: Settings> ConfigStore<S> {
    /// Opens `<directory>/<name>.ini` for `settings` with default options.
    ///
    /// # Errors
    /// Returns `ConfigError::Schema` if a field type of `S` cannot be converted.
    pub fn new(settings: S, directory: impl AsRef<Path>, name: &str) -> Result<Self, ConfigError> {
        Self::with_options(settings, directory, name, StoreOptions::default())
    }

    /// Opens `<directory>/<name>.ini` for `settings`.
    ///
    /// Load and save failures during construction are logged, not returned;
    /// the settings keep whatever values could be read.
    ///
    /// # Errors
    /// Returns `ConfigError::Schema` if a field type of `S` cannot be converted.
    #[instrument(skip(settings, directory, options), fields(directory = %directory.as_ref().display()))]
    pub fn with_options(
        settings: S,
        directory: impl AsRef<Path>,
        name: &str,
        options: StoreOptions,
    ) -> Result<Self, ConfigError> {
        options.registry.validate(&S::schema())?;

        let (change_sender, _) = broadcast::channel(64);
        let inner = Arc::new(StoreInner {
            file: PersistedFile::new(directory, name),
            settings: Arc::new(RwLock::new(settings)),
            serializer: Mutex::new(SettingsSerializer::new(options.registry)),
            saving: AtomicBool::new(false),
            last_written: Mutex::new(None),
            save_triggers_reload: options.save_triggers_reload,
            retry_delay: options.retry_delay,
            listeners: RwLock::new(Vec::new()),
            change_sender,
        });

        if let Err(e) = inner.load() {
            warn!("Failed to load settings from {}: {e}", inner.file.primary().display());
        }
        let _ = inner.save_with_retry(false);

        let monitor = if options.watch {
            Self::start_monitor(&inner)
        } else {
            None
        };

        info!(path = %inner.file.primary().display(), "Settings store opened");
        Ok(Self {
            inner,
            monitor: Mutex::new(monitor),
        })
    }

    fn start_monitor(inner: &Arc<StoreInner<S>>) -> Option<ChangeMonitor> {
        let handler = Arc::clone(inner);
        match ChangeMonitor::start(inner.file.primary(), move |event| handler.on_file_event(&event)) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                warn!("Settings file will not be reloaded on external edits: {e}");
                None
            }
        }
    }

    /// Paths of the settings file and its sidecars.
    pub fn file(&self) -> &PersistedFile {
        &self.inner.file
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        self.inner.file.primary()
    }

    /// Whether external edits are currently being watched.
    pub fn is_watching(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Borrows the settings for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, S> {
        self.inner.read_settings()
    }

    /// Returns a copy of the current settings, handling poisoned locks gracefully
    pub fn get_current(&self) -> S
    where
        S: Clone,
    {
        self.read().clone()
    }

    /// Shared handle to the settings object, for components that outlive a borrow.
    pub fn settings(&self) -> Arc<RwLock<S>> {
        Arc::clone(&self.inner.settings)
    }

    /// Mutates the settings in memory. Call [`save`](Self::save) to persist.
    pub fn update<R>(&self, change: impl FnOnce(&mut S) -> R) -> R {
        let mut settings = self
            .inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        change(&mut settings)
    }

    /// Writes the current settings to disk.
    ///
    /// On failure one retry is scheduled after the configured delay; the
    /// error is also returned for callers that want to report it.
    ///
    /// # Errors
    /// Returns `ConfigError::PersistenceError` if the file could not be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.inner.save_with_retry(false)
    }

    /// Re-reads the settings file into memory without notifying listeners.
    ///
    /// # Errors
    /// Returns `ConfigError::IoError` if the file exists but cannot be read.
    pub fn reload(&self) -> Result<LoadReport, ConfigError> {
        self.inner.load()
    }

    /// Registers a callback invoked with the settings after every reload
    /// caused by an external edit.
    pub fn on_config_changed(&self, listener: impl Fn(&S) + Send + Sync + 'static) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Stream of reload notifications.
    pub fn subscribe(&self) -> impl Stream<Item = ConfigChange> + use<S> {
        self.subscribe_to_key("*")
    }

    /// Stream of reload notifications that touched a key matching `pattern`.
    ///
    /// Patterns use on-disk keys with `*` wildcards (e.g. `Twitch.*`).
    pub fn subscribe_to_key(&self, pattern: &str) -> impl Stream<Item = ConfigChange> + use<S> {
        let pattern = pattern.to_string();
        let receiver = self.inner.change_sender.subscribe();

        futures::stream::unfold(receiver, move |mut receiver| {
            let pattern = pattern.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(change) => {
                            if change.keys.iter().any(|key| path_matches(key, &pattern)) {
                                return Some((change, receiver));
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Change subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
    }

    /// Generic map view of the visible settings.
    pub fn to_structured(&self) -> serde_json::Map<String, serde_json::Value> {
        projection::to_structured(&*self.read())
    }

    /// Applies values from a generic map view and saves the result.
    ///
    /// # Errors
    /// Returns `ConfigError::Projection` if a value cannot be coerced; nothing
    /// is applied in that case. Save failures are returned as from [`save`](Self::save).
    pub fn apply_from_structured(
        &self,
        input: &serde_json::Value,
    ) -> Result<ProjectionReport, ConfigError> {
        let report = {
            let _io = self.inner.lock_serializer();
            let mut settings = self
                .inner
                .settings
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            projection::apply_from_structured(&mut *settings, input)?
        };

        self.save()?;
        Ok(report)
    }

    /// Stops watching the settings file.
    ///
    /// A retry already scheduled by a failed save still runs.
    pub fn close(&self) {
        let monitor = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(monitor) = monitor {
            monitor.stop();
            debug!(path = %self.path().display(), "Settings store closed");
        }
    }
}

impl<S: Settings> Drop for ConfigStore<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: Settings> StoreInner<S> {
    fn read_settings(&self) -> RwLockReadGuard<'_, S> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_serializer(&self) -> MutexGuard<'_, SettingsSerializer> {
        self.serializer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<LoadReport, ConfigError> {
        let mut serializer = self.lock_serializer();

        self.file.promote_backup()?;
        let Some(text) = self.file.read()? else {
            debug!(path = %self.file.primary().display(), "No settings file yet");
            return Ok(LoadReport::default());
        };

        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let report = serializer.apply(&mut *settings, &text);

        debug!(
            applied = report.applied.len(),
            unknown = report.unknown.len(),
            rejected = report.rejected.len(),
            "Loaded settings"
        );
        Ok(report)
    }

    fn save_with_retry(self: &Arc<Self>, is_retry: bool) -> Result<(), ConfigError> {
        let result = {
            let serializer = self.lock_serializer();
            self.saving.store(true, Ordering::SeqCst);
            let result = self.write(&serializer);
            self.saving.store(false, Ordering::SeqCst);
            result
        };

        if let Err(e) = &result {
            if is_retry {
                error!("Retried save failed, giving up: {e}");
            } else {
                warn!("Failed to save settings, retrying in {:?}: {e}", self.retry_delay);
                self.schedule_retry();
            }
        }

        result
    }

    fn write(&self, serializer: &SettingsSerializer) -> Result<(), ConfigError> {
        let document = serializer.render(&*self.read_settings());

        *self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(fingerprint(document.as_bytes()));

        self.file.write_atomically(&document)
    }

    fn schedule_retry(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        let delay = self.retry_delay;

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tokio::task::spawn_blocking(move || inner.save_with_retry(true)).await;
            });
            return;
        }

        let spawned = thread::Builder::new()
            .name("config-save-retry".to_string())
            .spawn(move || {
                thread::sleep(delay);
                let _ = inner.save_with_retry(true);
            });

        if let Err(e) = spawned {
            error!("Could not schedule settings save retry: {e}");
        }
    }

    /// Whether the file on disk holds exactly what this store last wrote.
    fn is_own_write(&self) -> bool {
        let Ok(Some(text)) = self.file.read() else {
            return false;
        };
        let last = *self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        last == Some(fingerprint(text.as_bytes()))
    }

    fn on_file_event(self: &Arc<Self>, event: &FileEvent) {
        let own_write = self.saving.load(Ordering::SeqCst) || self.is_own_write();

        if own_write && !self.save_triggers_reload {
            debug!(kind = ?event.kind, "Ignoring change caused by own save");
            return;
        }

        let report = match self.load() {
            Ok(report) => report,
            Err(e) => {
                warn!("Failed to reload settings after file change: {e}");
                return;
            }
        };

        let source = if own_write {
            ChangeSource::Save
        } else {
            ChangeSource::FileEdit
        };
        info!(?source, applied = report.applied.len(), "Settings reloaded");

        self.notify(source, report);
    }

    fn notify(&self, source: ChangeSource, report: LoadReport) {
        let listeners: Vec<ChangeListener<S>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if !listeners.is_empty() {
            let settings = self.read_settings();
            for listener in &listeners {
                listener(&*settings);
            }
        }

        let _ = self.change_sender.send(ConfigChange::new(source, report));
    }
}

fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Sha256::digest(bytes).into()
}
