//! Config file watcher for hot reload.
//!
//! Polls the directory holding the config file and reports changes to the
//! file itself.  Watching the directory rather than the file keeps working
//! across editors that save by writing a new file and renaming it over the
//! old one.

use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// The config file changed and should be read again.
#[derive(Debug, Clone)]
pub struct ConfigReloadEvent {
    pub path: PathBuf,
}

/// Errors from setting up the watcher.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("config path has no file name or parent: {0}")]
    BadPath(PathBuf),
    #[error("cannot watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Watches one config file and queues a [`ConfigReloadEvent`] per change.
pub struct ConfigWatcher {
    /// Kept alive to keep polling.
    _watcher: PollWatcher,
    events: Receiver<ConfigReloadEvent>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher").finish_non_exhaustive()
    }
}

/// Whether a filesystem event is a write to the file named `filename`.
fn is_config_change(event: &Event, filename: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|f| f == filename.as_os_str()))
}

impl ConfigWatcher {
    /// Start watching `config_path`, polling every `poll_interval_ms`.
    ///
    /// # Errors
    ///
    /// Fails if the file does not exist or its directory cannot be watched.
    pub fn new(config_path: &Path, poll_interval_ms: u64) -> Result<Self, WatchError> {
        if !config_path.exists() {
            return Err(WatchError::NotFound(config_path.to_path_buf()));
        }
        let canonical = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());
        let (filename, parent_dir) = match (canonical.file_name(), canonical.parent()) {
            (Some(name), Some(parent)) => (name.to_os_string(), parent.to_path_buf()),
            _ => return Err(WatchError::BadPath(canonical)),
        };

        let (tx, rx) = channel();
        let reported_path = canonical.clone();
        let mut watcher = PollWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) if is_config_change(&event, &filename) => {
                    log::debug!("config file changed: {}", reported_path.display());
                    let _ = tx.send(ConfigReloadEvent {
                        path: reported_path.clone(),
                    });
                }
                Ok(_) => {}
                Err(e) => log::warn!("config watch error: {}", e),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_millis(poll_interval_ms)),
        )
        .map_err(|source| WatchError::Notify {
            path: parent_dir.clone(),
            source,
        })?;

        watcher
            .watch(&parent_dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Notify {
                path: parent_dir.clone(),
                source,
            })?;

        log::info!("watching {} for changes", canonical.display());

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Next pending change, if any.
    pub fn try_recv(&self) -> Option<ConfigReloadEvent> {
        self.events.try_recv().ok()
    }

    /// Block until the next change.  `None` once the watcher has stopped.
    pub fn recv(&self) -> Option<ConfigReloadEvent> {
        self.events.recv().ok()
    }

    /// Block until the next change or until `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ConfigReloadEvent> {
        self.events.recv_timeout(timeout).ok()
    }
}
