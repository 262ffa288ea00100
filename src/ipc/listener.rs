//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`GestureEvent`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"Begin":{"type":"Swipe","direction":"Left","percentage":0.0,"fingers":3,"device":"Touchpad","time":1200}}
//! {"Update":{"type":"Swipe","direction":"Left","percentage":42.5,"fingers":3,"device":"Touchpad","time":1260}}
//! {"End":{"type":"Swipe","direction":"Left","percentage":71.0,"fingers":3,"device":"Touchpad","time":1330}}
//! ```

use crate::gesture::GestureEvent;
use crate::traits::EventSource;
use log::{debug, error, info, trace, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`EventSource`] that listens on a Unix stream socket for
/// JSON-encoded gesture events.
///
/// Clients are served one after another; each may send any number of
/// events before disconnecting.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("cannot bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UnixSocketListener {
    /// A listener for `path`.  Nothing is bound until
    /// [`run`](EventSource::run).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Parse one line of the wire format.  Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<GestureEvent>, serde_json::Error> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Whether the consumer is still listening after a client is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forwarded {
    ClientDone,
    SinkClosed,
}

/// Forward every valid event read from `client` into `sink`.
///
/// Malformed lines are logged and skipped; a read error ends the client.
fn forward_events<R: BufRead>(client: R, sink: &mpsc::Sender<GestureEvent>) -> Forwarded {
    for line in client.lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                warn!("dropping gesture client after read error: {}", e);
                return Forwarded::ClientDone;
            }
        };
        let event = match parse_line(&text) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!("ignoring malformed gesture event {:?}: {}", text, e);
                continue;
            }
        };
        trace!("received {:?}", event);
        if sink.send(event).is_err() {
            return Forwarded::SinkClosed;
        }
    }
    Forwarded::ClientDone
}

impl EventSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and serve clients until the consumer goes away.
    ///
    /// Blocks; run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<GestureEvent>) -> Result<(), Self::Error> {
        // A socket file left by a previous run would make bind fail.
        let _ = std::fs::remove_file(&self.path);
        let listener = UnixListener::bind(&self.path).map_err(|source| UnixSocketError::Bind {
            path: self.path.clone(),
            source,
        })?;
        info!("listening for gesture events on {}", self.path.display());

        for client in listener.incoming() {
            let client = match client {
                Ok(client) => client,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("gesture client connected");
            if forward_events(BufReader::new(client), &sink) == Forwarded::SinkClosed {
                info!("event consumer gone, closing {}", self.path.display());
                break;
            }
            debug!("gesture client disconnected");
        }
        let _ = std::fs::remove_file(&self.path);
        Ok(())
    }
}

//  Tests
