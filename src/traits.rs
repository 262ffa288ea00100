//! Core traits that decouple touchbind from any specific desktop or
//! transport mechanism.
//!
//! * [`Desktop`] is the action surface: window and workspace operations the
//!   built-in actions are made of.
//! * [`EventSource`] is the transport that delivers gesture events.
//! * [`GestureHandler`] is the three-callback contract of the gesture
//!   daemon, implemented by the [`GestureManager`](crate::manager::GestureManager).

use crate::gesture::{GestureAttrs, GestureEvent};
use std::fmt;
use std::sync::mpsc;

/// Geometric direction for workspace neighbours and tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionDirection {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for MotionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionDirection::Up => write!(f, "up"),
            MotionDirection::Down => write!(f, "down"),
            MotionDirection::Left => write!(f, "left"),
            MotionDirection::Right => write!(f, "right"),
        }
    }
}

/// Opaque workspace identifier, meaningful to the [`Desktop`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(pub i64);

/// Minimal information about the focused window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Desktop address / id of the window.
    pub address: String,
    /// Human-readable title.
    pub title: String,
    pub maximized: bool,
    pub fullscreen: bool,
}

/// Abstraction over the desktop environment.
///
/// Every call is synchronous and best effort.  An implementation might talk
/// to Hyprland via IPC, or it might be a recording stub used in tests.
pub trait Desktop {
    /// The error type produced by this desktop.
    type Error: std::error::Error + Send + 'static;

    /// The focused window, or `None` when nothing has focus.
    fn focused_window(&self) -> Result<Option<WindowInfo>, Self::Error>;

    fn minimize(&self, window: &WindowInfo) -> Result<(), Self::Error>;

    fn set_maximized(&self, window: &WindowInfo, maximized: bool) -> Result<(), Self::Error>;

    fn close(&self, window: &WindowInfo) -> Result<(), Self::Error>;

    fn set_fullscreen(&self, window: &WindowInfo, fullscreen: bool) -> Result<(), Self::Error>;

    /// Tile `window` towards `direction`.
    fn push_tile(&self, window: &WindowInfo, direction: MotionDirection) -> Result<(), Self::Error>;

    fn active_workspace(&self) -> Result<WorkspaceId, Self::Error>;

    /// The workspace next to `workspace` in `direction`.
    ///
    /// When there is no such workspace, `workspace` itself is returned.
    fn neighbor(
        &self,
        workspace: WorkspaceId,
        direction: MotionDirection,
    ) -> Result<WorkspaceId, Self::Error>;

    /// Switch to `workspace`.  Activating the current workspace is a no-op.
    fn activate_workspace(&self, workspace: WorkspaceId) -> Result<(), Self::Error>;

    /// Whether a full-screen surface currently owns all input, in which case
    /// overview and expo must not be shown.
    fn stage_is_fullscreen(&self) -> Result<bool, Self::Error>;

    fn toggle_overview(&self) -> Result<(), Self::Error>;

    fn toggle_expo(&self) -> Result<(), Self::Error>;

    /// Hide both overview and expo if either is showing.
    fn hide_overlays(&self) -> Result<(), Self::Error>;

    fn toggle_desktop(&self) -> Result<(), Self::Error>;
}

/// The begin / update / end contract of the gesture daemon.
///
/// Events are delivered serially and in arrival order.
pub trait GestureHandler {
    fn begin(&mut self, attrs: &GestureAttrs);
    fn update(&mut self, attrs: &GestureAttrs);
    fn end(&mut self, attrs: &GestureAttrs);

    /// Route a tagged [`GestureEvent`] to the matching callback.
    fn handle(&mut self, event: &GestureEvent) {
        match event {
            GestureEvent::Begin(attrs) => self.begin(attrs),
            GestureEvent::Update(attrs) => self.update(attrs),
            GestureEvent::End(attrs) => self.end(attrs),
        }
    }
}

/// A source of [`GestureEvent`]s.
///
/// Implementations listen on some transport (a Unix socket, a daemon
/// client library, an in-memory script) and forward parsed events into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Events are sent in the order they were received, each exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming event into `sink`.
    fn run(&mut self, sink: mpsc::Sender<GestureEvent>) -> Result<(), Self::Error>;
}
