//! IPC listener that accepts gesture events over a Unix socket.
//!
//! A bridge to the gesture daemon (or a test script) connects to the socket
//! and writes newline-delimited JSON events.

pub mod listener;
