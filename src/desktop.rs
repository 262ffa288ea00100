//! A [`Desktop`] that only logs what it would do (`--dry-run`).
//!
//! Useful for trying out a configuration without touching the session.  It
//! pretends there is one window with focus and a single row of workspaces,
//! and tracks the state its own calls change so consecutive gestures log
//! sensible results.

use crate::traits::{Desktop, MotionDirection, WindowInfo, WorkspaceId};
use log::info;
use std::cell::{Cell, RefCell};

/// Number of workspaces the dry-run desktop pretends to have.
const WORKSPACES: i64 = 4;

pub struct DryRunDesktop {
    window: RefCell<WindowInfo>,
    workspace: Cell<i64>,
}

#[derive(Debug, thiserror::Error)]
#[error("dry run")]
pub struct DryRunError;

impl DryRunDesktop {
    pub fn new() -> Self {
        Self {
            window: RefCell::new(WindowInfo {
                address: "dry-run".into(),
                title: "dry run window".into(),
                maximized: false,
                fullscreen: false,
            }),
            workspace: Cell::new(1),
        }
    }
}

impl Default for DryRunDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl Desktop for DryRunDesktop {
    type Error = DryRunError;

    fn focused_window(&self) -> Result<Option<WindowInfo>, DryRunError> {
        Ok(Some(self.window.borrow().clone()))
    }

    fn minimize(&self, window: &WindowInfo) -> Result<(), DryRunError> {
        info!("[dry-run] minimize {:?}", window.title);
        Ok(())
    }

    fn set_maximized(&self, window: &WindowInfo, maximized: bool) -> Result<(), DryRunError> {
        info!("[dry-run] set maximized={} on {:?}", maximized, window.title);
        self.window.borrow_mut().maximized = maximized;
        Ok(())
    }

    fn close(&self, window: &WindowInfo) -> Result<(), DryRunError> {
        info!("[dry-run] close {:?}", window.title);
        Ok(())
    }

    fn set_fullscreen(&self, window: &WindowInfo, fullscreen: bool) -> Result<(), DryRunError> {
        info!("[dry-run] set fullscreen={} on {:?}", fullscreen, window.title);
        self.window.borrow_mut().fullscreen = fullscreen;
        Ok(())
    }

    fn push_tile(&self, window: &WindowInfo, direction: MotionDirection) -> Result<(), DryRunError> {
        info!("[dry-run] tile {:?} {}", window.title, direction);
        Ok(())
    }

    fn active_workspace(&self) -> Result<WorkspaceId, DryRunError> {
        Ok(WorkspaceId(self.workspace.get()))
    }

    fn neighbor(
        &self,
        workspace: WorkspaceId,
        direction: MotionDirection,
    ) -> Result<WorkspaceId, DryRunError> {
        let id = match direction {
            MotionDirection::Left if workspace.0 > 1 => workspace.0 - 1,
            MotionDirection::Right if workspace.0 < WORKSPACES => workspace.0 + 1,
            _ => workspace.0,
        };
        Ok(WorkspaceId(id))
    }

    fn activate_workspace(&self, workspace: WorkspaceId) -> Result<(), DryRunError> {
        if self.workspace.get() != workspace.0 {
            info!("[dry-run] switch to workspace {}", workspace.0);
            self.workspace.set(workspace.0);
        }
        Ok(())
    }

    fn stage_is_fullscreen(&self) -> Result<bool, DryRunError> {
        Ok(false)
    }

    fn toggle_overview(&self) -> Result<(), DryRunError> {
        info!("[dry-run] toggle overview");
        Ok(())
    }

    fn toggle_expo(&self) -> Result<(), DryRunError> {
        info!("[dry-run] toggle expo");
        Ok(())
    }

    fn hide_overlays(&self) -> Result<(), DryRunError> {
        info!("[dry-run] hide overlays");
        Ok(())
    }

    fn toggle_desktop(&self) -> Result<(), DryRunError> {
        info!("[dry-run] toggle desktop");
        Ok(())
    }
}
