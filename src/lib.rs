//! **touchbind**: maps touch gestures to desktop actions.
//!
//! A touch-gesture daemon recognises swipes, pinches and taps and reports
//! each one as a *begin*, any number of *updates* and an *end*.  touchbind
//! tracks that stream one gesture at a time, looks the gesture up in a
//! table built from the user's configuration and, when the gesture
//! completes far enough, runs the bound action: a built-in desktop
//! operation or an external command.
//!
//! # Architecture
//!
//! The crate is organised around three core traits:
//!
//! * [`traits::Desktop`]: the window and workspace operations built-in
//!   actions are made of, so dispatch is not coupled to any compositor.
//! * [`traits::EventSource`]: the transport delivering gesture events.
//! * [`traits::GestureHandler`]: the begin / update / end contract,
//!   implemented by [`manager::GestureManager`].
//!
//! The core is [`session`] (the one-gesture state machine), [`bindings`]
//! (the atomically replaced binding table) and [`dispatch`].  Concrete
//! implementations live in [`hyprland`] (Hyprland IPC), [`desktop`]
//! (dry run) and [`ipc`] (Unix-socket event listener).

pub mod action;
pub mod bindings;
pub mod config;
pub mod daemon;
pub mod desktop;
pub mod dispatch;
pub mod gesture;
pub mod hyprland;
pub mod ipc;
pub mod manager;
pub mod session;
pub mod traits;
