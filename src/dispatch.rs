//! Turning an [`ActionSpec`] into an effect.
//!
//! Built-in actions are translated into calls on a [`Desktop`].  External
//! commands are split shell-style and handed to a [`Launcher`], which by
//! default spawns a detached child process.
//!
//! Nothing here ever returns an error to the caller: failures are logged at
//! the dispatch boundary and swallowed, so a bad binding can never take the
//! event loop down.

use crate::action::{ActionSpec, BuiltinAction};
use crate::traits::{Desktop, MotionDirection, WindowInfo};
use log::{debug, info, warn};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Anything that can carry out a completed gesture's action.
pub trait Dispatch {
    /// Perform `action`.  Must not panic and must not block on external
    /// commands.
    fn dispatch(&mut self, action: &ActionSpec);
}

/// Starts external commands.
pub trait Launcher {
    /// Start `argv` without waiting for it.  `argv` is never empty.
    fn launch(&self, argv: &[String]) -> std::io::Result<()>;
}

/// [`Launcher`] that spawns a child process and reaps it on a background
/// thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnLauncher;

impl Launcher for SpawnLauncher {
    fn launch(&self, argv: &[String]) -> std::io::Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command line",
            ));
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()?;
        let program = program.clone();
        std::thread::Builder::new()
            .name("touchbind-reaper".into())
            .spawn(move || match child.wait() {
                Ok(status) => debug!("{} exited with {}", program, status),
                Err(e) => debug!("failed to wait for {}: {}", program, e),
            })?;
        Ok(())
    }
}

/// Errors raised while carrying out an action.  Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("desktop error: {0}")]
    Desktop(String),
    #[error("cannot parse command line {0:?}")]
    CommandLine(String),
    #[error("failed to execute {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve a workspace action to the geometric direction to move in.
///
/// Next and previous map to left and right, swapped when natural scrolling
/// is on.  Up and down map directly.  Returns `None` for non-workspace
/// actions.
pub fn workspace_direction(action: BuiltinAction, natural_scroll: bool) -> Option<MotionDirection> {
    match action {
        BuiltinAction::WorkspaceNext => Some(if natural_scroll {
            MotionDirection::Right
        } else {
            MotionDirection::Left
        }),
        BuiltinAction::WorkspacePrevious => Some(if natural_scroll {
            MotionDirection::Left
        } else {
            MotionDirection::Right
        }),
        BuiltinAction::WorkspaceUp => Some(MotionDirection::Up),
        BuiltinAction::WorkspaceDown => Some(MotionDirection::Down),
        _ => None,
    }
}

fn tile_direction(action: BuiltinAction) -> Option<MotionDirection> {
    match action {
        BuiltinAction::PushTileUp => Some(MotionDirection::Up),
        BuiltinAction::PushTileDown => Some(MotionDirection::Down),
        BuiltinAction::PushTileLeft => Some(MotionDirection::Left),
        BuiltinAction::PushTileRight => Some(MotionDirection::Right),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Overlay {
    Overview,
    Expo,
}

/// The production [`Dispatch`] implementation.
///
/// Generic over the [`Desktop`] backend and the [`Launcher`] so both can be
/// replaced by recording doubles in tests.
pub struct ActionDispatcher<D: Desktop, L: Launcher = SpawnLauncher> {
    desktop: D,
    launcher: L,
    natural_scroll: Arc<AtomicBool>,
}

impl<D: Desktop> ActionDispatcher<D> {
    pub fn new(desktop: D) -> Self {
        Self::with_launcher(desktop, SpawnLauncher)
    }
}

impl<D: Desktop, L: Launcher> ActionDispatcher<D, L> {
    pub fn with_launcher(desktop: D, launcher: L) -> Self {
        Self {
            desktop,
            launcher,
            natural_scroll: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn desktop(&self) -> &D {
        &self.desktop
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn set_natural_scroll(&self, enabled: bool) {
        self.natural_scroll.store(enabled, Ordering::Relaxed);
    }

    /// Shared flag, so a config reload on another thread can flip natural
    /// scrolling without touching the dispatcher.
    pub fn natural_scroll_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.natural_scroll)
    }

    fn try_dispatch(&self, action: &ActionSpec) -> Result<(), DispatchError> {
        match action {
            ActionSpec::Builtin(builtin) => self.run_builtin(*builtin),
            ActionSpec::Exec(command) => self.run_exec(command),
        }
    }

    fn run_builtin(&self, action: BuiltinAction) -> Result<(), DispatchError> {
        if let Some(dir) = workspace_direction(action, self.natural_scroll.load(Ordering::Relaxed)) {
            return self.switch_workspace(dir);
        }
        if let Some(dir) = tile_direction(action) {
            return self.with_focused(|d, w| d.push_tile(w, dir));
        }
        match action {
            BuiltinAction::Disabled => Ok(()),
            BuiltinAction::ToggleExpo => self.toggle_overlay(Overlay::Expo),
            BuiltinAction::ToggleOverview => self.toggle_overlay(Overlay::Overview),
            BuiltinAction::Minimize => self.with_focused(|d, w| d.minimize(w)),
            BuiltinAction::Maximize => self.with_focused(|d, w| d.set_maximized(w, !w.maximized)),
            BuiltinAction::Close => self.with_focused(|d, w| d.close(w)),
            BuiltinAction::Fullscreen => {
                self.with_focused(|d, w| d.set_fullscreen(w, !w.fullscreen))
            }
            BuiltinAction::Unfullscreen => self.with_focused(|d, w| {
                if w.fullscreen {
                    d.set_fullscreen(w, false)
                } else {
                    Ok(())
                }
            }),
            BuiltinAction::ToggleDesktop => self.desktop.toggle_desktop().map_err(desktop_err),
            // Workspace and tile actions were handled above.
            _ => Ok(()),
        }
    }

    /// Run `op` on the focused window; no-op when nothing has focus.
    fn with_focused<F>(&self, op: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&D, &WindowInfo) -> Result<(), D::Error>,
    {
        match self.desktop.focused_window().map_err(desktop_err)? {
            Some(window) => {
                debug!("acting on focused window {:?}", window.title);
                op(&self.desktop, &window).map_err(desktop_err)
            }
            None => {
                debug!("no focused window, nothing to do");
                Ok(())
            }
        }
    }

    fn switch_workspace(&self, direction: MotionDirection) -> Result<(), DispatchError> {
        let current = self.desktop.active_workspace().map_err(desktop_err)?;
        let target = self
            .desktop
            .neighbor(current, direction)
            .map_err(desktop_err)?;
        if target == current {
            debug!("no workspace {} of {:?}", direction, current);
        } else {
            info!("switching workspace {} to {:?}", direction, target);
        }
        self.desktop.activate_workspace(target).map_err(desktop_err)
    }

    fn toggle_overlay(&self, overlay: Overlay) -> Result<(), DispatchError> {
        if self.desktop.stage_is_fullscreen().map_err(desktop_err)? {
            debug!("stage is fullscreen, hiding overlays instead of toggling {:?}", overlay);
            return self.desktop.hide_overlays().map_err(desktop_err);
        }
        let result = match overlay {
            Overlay::Overview => self.desktop.toggle_overview(),
            Overlay::Expo => self.desktop.toggle_expo(),
        };
        result.map_err(desktop_err)
    }

    fn run_exec(&self, command: &str) -> Result<(), DispatchError> {
        info!("custom action: {}", command);
        let argv = match shlex::split(command) {
            Some(argv) if !argv.is_empty() => argv,
            _ => return Err(DispatchError::CommandLine(command.to_string())),
        };
        self.launcher
            .launch(&argv)
            .map_err(|source| DispatchError::Spawn {
                command: command.to_string(),
                source,
            })
    }
}

fn desktop_err<E: std::error::Error>(e: E) -> DispatchError {
    DispatchError::Desktop(e.to_string())
}

impl<D: Desktop, L: Launcher> Dispatch for ActionDispatcher<D, L> {
    fn dispatch(&mut self, action: &ActionSpec) {
        debug!("dispatching {}", action);
        if let Err(e) = self.try_dispatch(action) {
            warn!("failed to execute gesture action {}: {}", action, e);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::traits::WorkspaceId;
    use std::cell::RefCell;

    //  Recording desktop

    /// A test double that records every call made to it.
    ///
    /// Workspaces form a single row `1..=workspaces` with no rows above or
    /// below.
    #[derive(Debug)]
    pub(crate) struct RecordingDesktop {
        pub window: Option<WindowInfo>,
        pub workspace: RefCell<i64>,
        pub workspaces: i64,
        pub stage_fullscreen: bool,
        pub fail: bool,
        pub log: RefCell<Vec<String>>,
    }

    impl Default for RecordingDesktop {
        fn default() -> Self {
            Self {
                window: Some(WindowInfo {
                    address: "0xbeef".into(),
                    title: "terminal".into(),
                    maximized: false,
                    fullscreen: false,
                }),
                workspace: RefCell::new(2),
                workspaces: 4,
                stage_fullscreen: false,
                fail: false,
                log: RefCell::new(Vec::new()),
            }
        }
    }

    impl RecordingDesktop {
        pub fn calls(&self) -> Vec<String> {
            self.log.borrow().clone()
        }

        fn record(&self, call: String) -> Result<(), RecorderErr> {
            self.log.borrow_mut().push(call);
            if self.fail {
                Err(RecorderErr)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    pub(crate) struct RecorderErr;

    impl Desktop for RecordingDesktop {
        type Error = RecorderErr;

        fn focused_window(&self) -> Result<Option<WindowInfo>, RecorderErr> {
            Ok(self.window.clone())
        }

        fn minimize(&self, w: &WindowInfo) -> Result<(), RecorderErr> {
            self.record(format!("minimize {}", w.address))
        }

        fn set_maximized(&self, w: &WindowInfo, on: bool) -> Result<(), RecorderErr> {
            self.record(format!("maximize {} {}", w.address, on))
        }

        fn close(&self, w: &WindowInfo) -> Result<(), RecorderErr> {
            self.record(format!("close {}", w.address))
        }

        fn set_fullscreen(&self, w: &WindowInfo, on: bool) -> Result<(), RecorderErr> {
            self.record(format!("fullscreen {} {}", w.address, on))
        }

        fn push_tile(&self, w: &WindowInfo, dir: MotionDirection) -> Result<(), RecorderErr> {
            self.record(format!("tile {} {}", w.address, dir))
        }

        fn active_workspace(&self) -> Result<WorkspaceId, RecorderErr> {
            Ok(WorkspaceId(*self.workspace.borrow()))
        }

        fn neighbor(&self, ws: WorkspaceId, dir: MotionDirection) -> Result<WorkspaceId, RecorderErr> {
            let next = match dir {
                MotionDirection::Left if ws.0 > 1 => ws.0 - 1,
                MotionDirection::Right if ws.0 < self.workspaces => ws.0 + 1,
                _ => ws.0,
            };
            Ok(WorkspaceId(next))
        }

        fn activate_workspace(&self, ws: WorkspaceId) -> Result<(), RecorderErr> {
            *self.workspace.borrow_mut() = ws.0;
            self.record(format!("activate {}", ws.0))
        }

        fn stage_is_fullscreen(&self) -> Result<bool, RecorderErr> {
            Ok(self.stage_fullscreen)
        }

        fn toggle_overview(&self) -> Result<(), RecorderErr> {
            self.record("toggle overview".into())
        }

        fn toggle_expo(&self) -> Result<(), RecorderErr> {
            self.record("toggle expo".into())
        }

        fn hide_overlays(&self) -> Result<(), RecorderErr> {
            self.record("hide overlays".into())
        }

        fn toggle_desktop(&self) -> Result<(), RecorderErr> {
            self.record("toggle desktop".into())
        }
    }

    //  Recording launcher

    #[derive(Debug, Default)]
    pub(crate) struct RecordingLauncher {
        pub launched: RefCell<Vec<Vec<String>>>,
        pub fail: bool,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, argv: &[String]) -> std::io::Result<()> {
            self.launched.borrow_mut().push(argv.to_vec());
            if self.fail {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"))
            } else {
                Ok(())
            }
        }
    }

    fn dispatcher(desktop: RecordingDesktop) -> ActionDispatcher<RecordingDesktop, RecordingLauncher> {
        ActionDispatcher::with_launcher(desktop, RecordingLauncher::default())
    }

    fn run(desktop: RecordingDesktop, action: BuiltinAction) -> Vec<String> {
        let mut d = dispatcher(desktop);
        d.dispatch(&ActionSpec::Builtin(action));
        d.desktop().calls()
    }

    //  Workspace direction

    #[test]
    fn natural_scroll_swaps_next_and_previous() {
        assert_eq!(
            workspace_direction(BuiltinAction::WorkspaceNext, true),
            workspace_direction(BuiltinAction::WorkspacePrevious, false)
        );
        assert_eq!(
            workspace_direction(BuiltinAction::WorkspacePrevious, true),
            workspace_direction(BuiltinAction::WorkspaceNext, false)
        );
        assert_eq!(
            workspace_direction(BuiltinAction::WorkspaceNext, false),
            Some(MotionDirection::Left)
        );
        assert_eq!(
            workspace_direction(BuiltinAction::WorkspaceNext, true),
            Some(MotionDirection::Right)
        );
    }

    #[test]
    fn up_and_down_ignore_natural_scroll() {
        for natural in [true, false] {
            assert_eq!(
                workspace_direction(BuiltinAction::WorkspaceUp, natural),
                Some(MotionDirection::Up)
            );
            assert_eq!(
                workspace_direction(BuiltinAction::WorkspaceDown, natural),
                Some(MotionDirection::Down)
            );
        }
        assert_eq!(workspace_direction(BuiltinAction::Close, true), None);
    }

    #[test]
    fn workspace_next_activates_neighbor() {
        let mut d = dispatcher(RecordingDesktop::default());
        d.set_natural_scroll(true);
        d.dispatch(&ActionSpec::Builtin(BuiltinAction::WorkspaceNext));
        assert_eq!(d.desktop().calls(), vec!["activate 3"]);

        d.set_natural_scroll(false);
        d.dispatch(&ActionSpec::Builtin(BuiltinAction::WorkspaceNext));
        assert_eq!(d.desktop().calls(), vec!["activate 3", "activate 2"]);
    }

    #[test]
    fn workspace_switch_without_neighbor_reactivates_current() {
        let calls = run(RecordingDesktop::default(), BuiltinAction::WorkspaceUp);
        assert_eq!(calls, vec!["activate 2"]);
    }

    //  Window actions

    #[test]
    fn window_actions_without_focus_are_noops() {
        for action in [
            BuiltinAction::Minimize,
            BuiltinAction::Maximize,
            BuiltinAction::Close,
            BuiltinAction::Fullscreen,
            BuiltinAction::Unfullscreen,
            BuiltinAction::PushTileLeft,
        ] {
            let desktop = RecordingDesktop {
                window: None,
                ..RecordingDesktop::default()
            };
            assert!(run(desktop, action).is_empty(), "{} should be a no-op", action);
        }
    }

    #[test]
    fn maximize_toggles() {
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::Maximize),
            vec!["maximize 0xbeef true"]
        );
        let mut desktop = RecordingDesktop::default();
        if let Some(w) = desktop.window.as_mut() {
            w.maximized = true;
        }
        assert_eq!(run(desktop, BuiltinAction::Maximize), vec!["maximize 0xbeef false"]);
    }

    #[test]
    fn fullscreen_toggles_and_unfullscreen_only_exits() {
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::Fullscreen),
            vec!["fullscreen 0xbeef true"]
        );
        assert!(run(RecordingDesktop::default(), BuiltinAction::Unfullscreen).is_empty());

        let mut desktop = RecordingDesktop::default();
        if let Some(w) = desktop.window.as_mut() {
            w.fullscreen = true;
        }
        assert_eq!(run(desktop, BuiltinAction::Unfullscreen), vec!["fullscreen 0xbeef false"]);
    }

    #[test]
    fn simple_window_actions() {
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::Minimize),
            vec!["minimize 0xbeef"]
        );
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::Close),
            vec!["close 0xbeef"]
        );
    }

    #[test]
    fn push_tile_directions() {
        let cases = [
            (BuiltinAction::PushTileUp, "tile 0xbeef up"),
            (BuiltinAction::PushTileDown, "tile 0xbeef down"),
            (BuiltinAction::PushTileLeft, "tile 0xbeef left"),
            (BuiltinAction::PushTileRight, "tile 0xbeef right"),
        ];
        for (action, expected) in cases {
            assert_eq!(run(RecordingDesktop::default(), action), vec![expected]);
        }
    }

    //  Overlays and desktop

    #[test]
    fn overlays_toggle_normally() {
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::ToggleExpo),
            vec!["toggle expo"]
        );
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::ToggleOverview),
            vec!["toggle overview"]
        );
    }

    #[test]
    fn overlays_are_hidden_while_stage_is_fullscreen() {
        for action in [BuiltinAction::ToggleExpo, BuiltinAction::ToggleOverview] {
            let desktop = RecordingDesktop {
                stage_fullscreen: true,
                ..RecordingDesktop::default()
            };
            assert_eq!(run(desktop, action), vec!["hide overlays"]);
        }
    }

    #[test]
    fn toggle_desktop_and_disabled() {
        assert_eq!(
            run(RecordingDesktop::default(), BuiltinAction::ToggleDesktop),
            vec!["toggle desktop"]
        );
        assert!(run(RecordingDesktop::default(), BuiltinAction::Disabled).is_empty());
    }

    #[test]
    fn desktop_failure_is_swallowed() {
        let desktop = RecordingDesktop {
            fail: true,
            ..RecordingDesktop::default()
        };
        assert_eq!(run(desktop, BuiltinAction::Close), vec!["close 0xbeef"]);
    }

    //  External commands

    #[test]
    fn exec_launches_split_command_line() {
        let mut d = dispatcher(RecordingDesktop::default());
        d.dispatch(&"EXEC:notify-send hello".parse().unwrap());
        assert_eq!(
            *d.launcher().launched.borrow(),
            vec![vec!["notify-send".to_string(), "hello".to_string()]]
        );
        assert!(d.desktop().calls().is_empty());
    }

    #[test]
    fn exec_honours_shell_quoting() {
        let mut d = dispatcher(RecordingDesktop::default());
        d.dispatch(&ActionSpec::Exec(r#"notify-send "hello world" 'a b'"#.into()));
        assert_eq!(
            d.launcher().launched.borrow()[0],
            vec!["notify-send", "hello world", "a b"]
        );
    }

    #[test]
    fn exec_launch_failure_is_swallowed() {
        let mut d = ActionDispatcher::with_launcher(
            RecordingDesktop::default(),
            RecordingLauncher {
                fail: true,
                ..RecordingLauncher::default()
            },
        );
        d.dispatch(&ActionSpec::Exec("notify-send hello".into()));
        assert_eq!(d.launcher().launched.borrow().len(), 1);
    }

    #[test]
    fn exec_unbalanced_quotes_never_launch() {
        let mut d = dispatcher(RecordingDesktop::default());
        d.dispatch(&ActionSpec::Exec("echo \"unterminated".into()));
        assert!(d.launcher().launched.borrow().is_empty());
    }

    #[test]
    fn spawn_launcher_reports_missing_program() {
        let launcher = SpawnLauncher;
        let argv = vec!["/nonexistent/touchbind-test-program".to_string()];
        assert!(launcher.launch(&argv).is_err());
    }

    #[test]
    fn real_dispatch_of_missing_program_does_not_panic() {
        let mut d = ActionDispatcher::new(RecordingDesktop::default());
        d.dispatch(&ActionSpec::Exec("/nonexistent/touchbind-test-program --flag".into()));
    }
}
