//! Application configuration.
//!
//! The configuration is a JSON file, by default
//! `$XDG_CONFIG_HOME/touchbind/config.json`.  The `"gestures"` section is a
//! flat mapping from binding keys to action strings, plus two reserved
//! threshold keys.  The file is watched for changes (see [`watcher`]) and
//! every change rebuilds the binding table.
//!
//! # Example
//!
//! ```json
//! {
//!   "gestures": {
//!     "swipe-percent-threshold": 60,
//!     "pinch-percent-threshold": 40,
//!     "swipe-left-3": "WORKSPACE_NEXT",
//!     "swipe-right-3": "WORKSPACE_PREVIOUS",
//!     "pinch-in-4": "TOGGLE_EXPO",
//!     "tap-3": "EXEC:notify-send hello",
//!     "swipe-up-4": ""
//!   },
//!   "touchpad": { "natural_scroll": true },
//!   "daemon": { "conflicting_client": "touchegg", "kill_conflicting": true }
//! }
//! ```

pub mod watcher;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Reserved key holding the swipe completion threshold.
pub const SWIPE_THRESHOLD_KEY: &str = "swipe-percent-threshold";
/// Reserved key holding the pinch completion threshold.
pub const PINCH_THRESHOLD_KEY: &str = "pinch-percent-threshold";

/// Keys of the `"gestures"` section that are not gesture bindings.
pub const NON_GESTURE_KEYS: [&str; 2] = [SWIPE_THRESHOLD_KEY, PINCH_THRESHOLD_KEY];

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Thresholds and gesture → action bindings.
    #[serde(default)]
    pub gestures: GestureSettings,

    /// Touchpad preferences that affect how actions are resolved.
    #[serde(default)]
    pub touchpad: TouchpadConfig,

    /// Startup behaviour towards other gesture clients.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// The `"gestures"` section.
///
/// Thresholds are percentages in `0..=100`.  Every other key is a binding
/// key such as `"swipe-left-3"` whose value is empty (unbound), a built-in
/// action identifier, or `EXEC:<command line>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Minimum swipe completion for the action to fire.  Default: `60`.
    #[serde(rename = "swipe-percent-threshold")]
    pub swipe_percent_threshold: u32,
    /// Minimum pinch completion for the action to fire.  Default: `40`.
    #[serde(rename = "pinch-percent-threshold")]
    pub pinch_percent_threshold: u32,
    /// Raw binding entries, keyed by binding key.
    #[serde(flatten)]
    pub bindings: BTreeMap<String, String>,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            swipe_percent_threshold: 60,
            pinch_percent_threshold: 40,
            bindings: BTreeMap::new(),
        }
    }
}

impl GestureSettings {
    /// Convenience constructor used by tests and embedders.
    pub fn with_bindings<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            bindings: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }
}

/// The `"touchpad"` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchpadConfig {
    /// Reverse the geometric direction of next / previous workspace
    /// switches.  Default: `true`.
    pub natural_scroll: bool,
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        Self {
            natural_scroll: true,
        }
    }
}

/// The `"daemon"` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Process name of the gesture client that competes for the daemon's
    /// events.  Default: `"touchegg"`.
    pub conflicting_client: String,
    /// Kill running instances of `conflicting_client` at startup.
    /// Default: `true`.
    pub kill_conflicting: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            conflicting_client: "touchegg".into(),
            kill_conflicting: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
