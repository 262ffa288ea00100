//! [`Desktop`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
//!
//! Hyprland's workspaces form a single numbered row, so the left and right
//! neighbours of workspace `n` are `n - 1` and `n + 1`, and there is nothing
//! above or below.  Overview and expo map to the `Hyprspace` and `hyprexpo`
//! plugin dispatchers; without those plugins the calls fail and are logged.
//! Show-desktop toggles an empty special workspace over the current one.

use crate::traits::{Desktop, MotionDirection, WindowInfo, WorkspaceId};
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed desktop.
///
/// All communication happens over Hyprland's IPC socket.  No child
/// processes are spawned.
#[derive(Debug, Default)]
pub struct HyprlandDesktop;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandError(String);

impl HyprlandDesktop {
    /// Create a new handle.
    ///
    /// No connection is opened eagerly; each method call opens a short-lived
    /// IPC request.
    pub fn new() -> Self {
        Self
    }
}

//  Direct Hyprland IPC helpers

/// Resolve the Hyprland command socket path.
fn socket_path() -> Result<PathBuf, HyprlandError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!(
        "{}/hypr/{}/.socket.sock",
        runtime_dir, his
    )))
}

/// Send a raw command to the Hyprland command socket and return the
/// response as a string.
fn ipc_request(command: &str) -> Result<String, HyprlandError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and return the raw JSON string.
fn ipc_json(data_command: &str) -> Result<String, HyprlandError> {
    ipc_request(&format!("j/{}", data_command))
}

/// Send a dispatch command and check for `"ok"`.
fn ipc_dispatch(args: &str) -> Result<(), HyprlandError> {
    let response = ipc_request(&format!("/dispatch {}", args))?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandError(format!("dispatch {:?}: {}", args, response.trim())))
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of the JSON object returned by `j/activewindow`.
#[derive(Deserialize)]
struct ActiveWindowJson {
    address: String,
    #[serde(default)]
    title: String,
    /// A bitmask (1 = maximized, 2 = fullscreen) on current Hyprland, a
    /// boolean paired with `fullscreenMode` on older releases.
    #[serde(default)]
    fullscreen: serde_json::Value,
    #[serde(default, rename = "fullscreenMode")]
    fullscreen_mode: Option<u8>,
}

/// Name of the special workspace shown by `toggle_desktop`.
const DESKTOP_SPECIAL: &str = "touchbind-desktop";

/// Subset of the JSON object returned by `j/activeworkspace`.
#[derive(Debug, Deserialize, PartialEq)]
struct WorkspaceJson {
    id: i64,
    #[serde(default, rename = "hasfullscreen")]
    has_fullscreen: bool,
}

fn parse_workspace(json: &str) -> Result<WorkspaceJson, HyprlandError> {
    serde_json::from_str(json).map_err(|e| HyprlandError(format!("parse: {}", e)))
}

/// Run every dispatch in `commands`, even after a failure.  The first error
/// is returned.
fn ipc_dispatch_all(commands: &[&str]) -> Result<(), HyprlandError> {
    commands
        .iter()
        .map(|c| ipc_dispatch(c))
        .fold(Ok(()), |acc, r| acc.and(r))
}

/// Decode `(maximized, fullscreen)` from an `activewindow` reply.
fn window_state(w: &ActiveWindowJson) -> (bool, bool) {
    match &w.fullscreen {
        serde_json::Value::Number(n) => {
            let mode = n.as_u64().unwrap_or(0);
            (mode & 1 != 0, mode & 2 != 0)
        }
        serde_json::Value::Bool(true) => match w.fullscreen_mode {
            Some(1) => (true, false),
            _ => (false, true),
        },
        _ => (false, false),
    }
}

/// Parse an `activewindow` reply.  Hyprland answers `{}` when nothing has
/// focus.
fn parse_active_window(json: &str) -> Result<Option<WindowInfo>, HyprlandError> {
    if json.trim() == "{}" {
        return Ok(None);
    }
    let w: ActiveWindowJson =
        serde_json::from_str(json).map_err(|e| HyprlandError(format!("parse: {}", e)))?;
    let (maximized, fullscreen) = window_state(&w);
    Ok(Some(WindowInfo {
        address: w.address,
        title: w.title,
        maximized,
        fullscreen,
    }))
}

/// Workspace next to `id` in `direction` on Hyprland's single row.
fn neighbor_id(id: i64, direction: MotionDirection) -> i64 {
    match direction {
        MotionDirection::Left if id > 1 => id - 1,
        MotionDirection::Right if id >= 1 => id + 1,
        _ => id,
    }
}

/// Dispatches that close expo and the overview.
const HIDE_OVERLAYS: [&str; 2] = ["hyprexpo:expo off", "overview:close"];

fn tile_arg(direction: MotionDirection) -> &'static str {
    match direction {
        MotionDirection::Up => "u",
        MotionDirection::Down => "d",
        MotionDirection::Left => "l",
        MotionDirection::Right => "r",
    }
}

//  Desktop implementation

impl Desktop for HyprlandDesktop {
    type Error = HyprlandError;

    fn focused_window(&self) -> Result<Option<WindowInfo>, Self::Error> {
        parse_active_window(&ipc_json("activewindow")?)
    }

    fn minimize(&self, window: &WindowInfo) -> Result<(), Self::Error> {
        ipc_dispatch(&format!(
            "movetoworkspacesilent special:minimized,address:{}",
            window.address
        ))
    }

    fn set_maximized(&self, _window: &WindowInfo, maximized: bool) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("fullscreenstate {} -1", if maximized { 1 } else { 0 }))
    }

    fn close(&self, window: &WindowInfo) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("closewindow address:{}", window.address))
    }

    fn set_fullscreen(&self, _window: &WindowInfo, fullscreen: bool) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("fullscreenstate {} -1", if fullscreen { 2 } else { 0 }))
    }

    fn push_tile(&self, _window: &WindowInfo, direction: MotionDirection) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("movewindow {}", tile_arg(direction)))
    }

    fn active_workspace(&self) -> Result<WorkspaceId, Self::Error> {
        let ws = parse_workspace(&ipc_json("activeworkspace")?)?;
        Ok(WorkspaceId(ws.id))
    }

    fn neighbor(
        &self,
        workspace: WorkspaceId,
        direction: MotionDirection,
    ) -> Result<WorkspaceId, Self::Error> {
        Ok(WorkspaceId(neighbor_id(workspace.0, direction)))
    }

    fn activate_workspace(&self, workspace: WorkspaceId) -> Result<(), Self::Error> {
        // `workspace <current>` can bounce back with `workspace_back_and_forth`.
        if self.active_workspace()? == workspace {
            return Ok(());
        }
        ipc_dispatch(&format!("workspace {}", workspace.0))
    }

    fn stage_is_fullscreen(&self) -> Result<bool, Self::Error> {
        Ok(parse_workspace(&ipc_json("activeworkspace")?)?.has_fullscreen)
    }

    fn toggle_overview(&self) -> Result<(), Self::Error> {
        ipc_dispatch("overview:toggle")
    }

    fn toggle_expo(&self) -> Result<(), Self::Error> {
        ipc_dispatch("hyprexpo:expo toggle")
    }

    fn hide_overlays(&self) -> Result<(), Self::Error> {
        ipc_dispatch_all(&HIDE_OVERLAYS)
    }

    fn toggle_desktop(&self) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("togglespecialworkspace {}", DESKTOP_SPECIAL))
    }
}
