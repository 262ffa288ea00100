//! Actions a gesture can be bound to.
//!
//! An action string from the configuration is either one of the built-in
//! identifiers (`WORKSPACE_NEXT`, `MINIMIZE`, …) or `EXEC:<command line>`.
//! [`ActionSpec`] is the parsed form; nothing downstream of the binding table
//! deals with action strings.

use std::fmt;
use std::str::FromStr;

/// Prefix that marks an external-command action.
pub const EXEC_PREFIX: &str = "EXEC:";

/// The closed set of built-in desktop operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAction {
    /// Explicitly bound to nothing.
    Disabled,
    WorkspaceNext,
    WorkspacePrevious,
    WorkspaceUp,
    WorkspaceDown,
    ToggleExpo,
    ToggleOverview,
    Minimize,
    /// Toggle between maximized and restored.
    Maximize,
    Close,
    /// Toggle fullscreen.
    Fullscreen,
    /// Leave fullscreen; no-op when the window is not fullscreen.
    Unfullscreen,
    PushTileUp,
    PushTileDown,
    PushTileLeft,
    PushTileRight,
    ToggleDesktop,
}

impl BuiltinAction {
    pub const ALL: [BuiltinAction; 17] = [
        BuiltinAction::Disabled,
        BuiltinAction::WorkspaceNext,
        BuiltinAction::WorkspacePrevious,
        BuiltinAction::WorkspaceUp,
        BuiltinAction::WorkspaceDown,
        BuiltinAction::ToggleExpo,
        BuiltinAction::ToggleOverview,
        BuiltinAction::Minimize,
        BuiltinAction::Maximize,
        BuiltinAction::Close,
        BuiltinAction::Fullscreen,
        BuiltinAction::Unfullscreen,
        BuiltinAction::PushTileUp,
        BuiltinAction::PushTileDown,
        BuiltinAction::PushTileLeft,
        BuiltinAction::PushTileRight,
        BuiltinAction::ToggleDesktop,
    ];

    /// Identifier used in the configuration file.
    pub fn identifier(self) -> &'static str {
        match self {
            BuiltinAction::Disabled => "DISABLED",
            BuiltinAction::WorkspaceNext => "WORKSPACE_NEXT",
            BuiltinAction::WorkspacePrevious => "WORKSPACE_PREVIOUS",
            BuiltinAction::WorkspaceUp => "WORKSPACE_UP",
            BuiltinAction::WorkspaceDown => "WORKSPACE_DOWN",
            BuiltinAction::ToggleExpo => "TOGGLE_EXPO",
            BuiltinAction::ToggleOverview => "TOGGLE_OVERVIEW",
            BuiltinAction::Minimize => "MINIMIZE",
            BuiltinAction::Maximize => "MAXIMIZE",
            BuiltinAction::Close => "CLOSE",
            BuiltinAction::Fullscreen => "FULLSCREEN",
            BuiltinAction::Unfullscreen => "UNFULLSCREEN",
            BuiltinAction::PushTileUp => "PUSH_TILE_UP",
            BuiltinAction::PushTileDown => "PUSH_TILE_DOWN",
            BuiltinAction::PushTileLeft => "PUSH_TILE_LEFT",
            BuiltinAction::PushTileRight => "PUSH_TILE_RIGHT",
            BuiltinAction::ToggleDesktop => "TOGGLE_DESKTOP",
        }
    }

    /// Look up a built-in by its exact identifier.
    pub fn from_identifier(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.identifier() == id)
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A parsed action: a built-in operation or an external command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionSpec {
    Builtin(BuiltinAction),
    /// Literal command line, without the `EXEC:` prefix.
    Exec(String),
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpec::Builtin(action) => write!(f, "{}", action),
            ActionSpec::Exec(command) => write!(f, "{}{}", EXEC_PREFIX, command),
        }
    }
}

/// Reasons an action string cannot be turned into an [`ActionSpec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("empty action")]
    Empty,
    #[error("EXEC action without a command")]
    EmptyCommand,
    #[error("unknown action {0:?}")]
    Unknown(String),
}

impl FromStr for ActionSpec {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ActionParseError::Empty);
        }
        if let Some(command) = s.strip_prefix(EXEC_PREFIX) {
            let command = command.trim();
            if command.is_empty() {
                return Err(ActionParseError::EmptyCommand);
            }
            return Ok(ActionSpec::Exec(command.to_string()));
        }
        BuiltinAction::from_identifier(s)
            .map(ActionSpec::Builtin)
            .ok_or_else(|| ActionParseError::Unknown(s.to_string()))
    }
}
