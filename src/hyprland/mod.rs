//! Hyprland-specific implementations.
//!
//! This module provides the [`Desktop`](crate::traits::Desktop) backend
//! powered by Hyprland's IPC socket.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod desktop;
