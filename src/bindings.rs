//! The binding table: canonical gesture key → configured action.
//!
//! A [`BindingTable`] is never patched in place.  Configuration changes go
//! through [`BindingTable::rebuild`], which produces a complete new table,
//! and [`SharedBindings::publish`], which swaps it in atomically.  Readers
//! therefore observe either the old or the new table, never a mix.
//!
//! Entries that fail to parse are excluded from the rebuilt table and
//! reported in [`Rebuilt::rejected`]; the remaining entries still apply.

use crate::action::{ActionParseError, ActionSpec};
use crate::config::{Config, ConfigError, GestureSettings, NON_GESTURE_KEYS};
use crate::gesture::{GestureKey, KeyParseError};
use arc_swap::ArcSwap;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A gesture key together with the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: GestureKey,
    pub action: ActionSpec,
}

/// Completion thresholds, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub swipe: u32,
    pub pinch: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        let settings = GestureSettings::default();
        Self {
            swipe: settings.swipe_percent_threshold,
            pinch: settings.pinch_percent_threshold,
        }
    }
}

/// A configuration entry that could not be turned into a [`Binding`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("invalid gesture key {key:?}: {source}")]
    Key {
        key: String,
        #[source]
        source: KeyParseError,
    },
    #[error("invalid action {action:?} for {key}: {source}")]
    Action {
        key: GestureKey,
        action: String,
        #[source]
        source: ActionParseError,
    },
}

/// Immutable snapshot of all bindings and thresholds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    bindings: HashMap<GestureKey, Binding>,
    thresholds: Thresholds,
}

/// Result of [`BindingTable::rebuild`].
#[derive(Debug, Clone)]
pub struct Rebuilt {
    pub table: BindingTable,
    /// Entries that were skipped because they did not parse.
    pub rejected: Vec<BindingError>,
}

impl BindingTable {
    /// Build a complete table from the `"gestures"` configuration section.
    ///
    /// Reserved threshold keys and empty action strings are skipped.  Every
    /// other entry must parse as a [`GestureKey`] and an [`ActionSpec`];
    /// failures are collected in [`Rebuilt::rejected`] and the entry is left
    /// out of the table.
    pub fn rebuild(settings: &GestureSettings) -> Rebuilt {
        let mut bindings = HashMap::new();
        let mut rejected = Vec::new();

        for (raw_key, raw_action) in &settings.bindings {
            if NON_GESTURE_KEYS.contains(&raw_key.as_str()) {
                continue;
            }
            if raw_action.trim().is_empty() {
                continue;
            }

            let key = match raw_key.parse::<GestureKey>() {
                Ok(key) => key,
                Err(source) => {
                    rejected.push(BindingError::Key {
                        key: raw_key.clone(),
                        source,
                    });
                    continue;
                }
            };
            let action = match raw_action.parse::<ActionSpec>() {
                Ok(action) => action,
                Err(source) => {
                    rejected.push(BindingError::Action {
                        key,
                        action: raw_action.clone(),
                        source,
                    });
                    continue;
                }
            };

            bindings.insert(key, Binding { key, action });
        }

        Rebuilt {
            table: Self {
                bindings,
                thresholds: Thresholds {
                    swipe: settings.swipe_percent_threshold,
                    pinch: settings.pinch_percent_threshold,
                },
            },
            rejected,
        }
    }

    pub fn lookup(&self, key: &GestureKey) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }
}

/// Shared handle on the currently published [`BindingTable`].
///
/// Cloning the handle shares the same slot.  The config watcher thread
/// publishes through one clone while the event loop reads through another.
#[derive(Debug, Clone)]
pub struct SharedBindings {
    current: Arc<ArcSwap<BindingTable>>,
}

impl Default for SharedBindings {
    fn default() -> Self {
        Self::new(BindingTable::default())
    }
}

impl SharedBindings {
    pub fn new(table: BindingTable) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    /// Snapshot of the latest published table.
    pub fn load(&self) -> Arc<BindingTable> {
        self.current.load_full()
    }

    /// Replace the published table.
    pub fn publish(&self, table: BindingTable) {
        self.current.store(Arc::new(table));
    }

    /// Rebuild from `settings`, log rejected entries, and publish the result.
    ///
    /// Returns the rejected entries so callers can surface them.
    pub fn reload(&self, settings: &GestureSettings) -> Vec<BindingError> {
        let Rebuilt { table, rejected } = BindingTable::rebuild(settings);
        for err in &rejected {
            warn!("skipping binding: {}", err);
        }
        for binding in table.iter() {
            debug!("binding {} → {}", binding.key, binding.action);
        }
        info!(
            "loaded {} gesture binding(s), swipe threshold {}%, pinch threshold {}%",
            table.len(),
            table.thresholds.swipe,
            table.thresholds.pinch
        );
        self.publish(table);
        rejected
    }
}

/// Re-read the config file at `path` and apply it.
///
/// On success the rebuilt table is published and `natural_scroll` takes the
/// file's value.  A file that cannot be read or parsed changes nothing.
pub fn apply_reload(
    path: &Path,
    bindings: &SharedBindings,
    natural_scroll: &AtomicBool,
) -> Result<Vec<BindingError>, ConfigError> {
    let config = Config::load(path)?;
    let rejected = bindings.reload(&config.gestures);
    natural_scroll.store(config.touchpad.natural_scroll, Ordering::Relaxed);
    Ok(rejected)
}
