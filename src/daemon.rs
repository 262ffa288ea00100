//! Startup cleanup: terminate a competing gesture client.
//!
//! The gesture daemon serves a single client.  A stand-alone client such as
//! `touchegg` holding the daemon's lock would steal every event, so at
//! startup we list file locks with `lslocks`, find the ones held by the
//! conflicting client and `kill` their owners.  Everything here is best
//! effort: failures are logged and startup carries on.

use log::{debug, info, warn};
use serde::Deserialize;
use std::process::Command;

/// Output of `lslocks --json --output COMMAND,PID`.
#[derive(Debug, Deserialize)]
struct LslocksOutput {
    #[serde(default)]
    locks: Vec<LockJson>,
}

#[derive(Debug, Deserialize)]
struct LockJson {
    command: Option<String>,
    pid: Option<serde_json::Value>,
}

/// Errors from the lock listing.
#[derive(Debug, thiserror::Error)]
pub enum ReaperError {
    #[error("failed to run lslocks: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("lslocks exited with {0}")]
    Status(std::process::ExitStatus),
    #[error("cannot parse lslocks output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// PIDs of the locks in `lslocks_json` held by a process called `client`.
///
/// Older util-linux releases print PIDs as strings, newer ones as numbers;
/// both are accepted.  Duplicates are removed.
pub fn conflicting_pids(lslocks_json: &str, client: &str) -> Result<Vec<u32>, serde_json::Error> {
    let output: LslocksOutput = serde_json::from_str(lslocks_json)?;
    let mut pids: Vec<u32> = output
        .locks
        .into_iter()
        .filter(|lock| lock.command.as_deref() == Some(client))
        .filter_map(|lock| match lock.pid? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect();
    pids.sort_unstable();
    pids.dedup();
    Ok(pids)
}

fn list_locks() -> Result<String, ReaperError> {
    let output = Command::new("lslocks")
        .args(["--json", "--output", "COMMAND,PID"])
        .output()?;
    if !output.status.success() {
        return Err(ReaperError::Status(output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Find and kill running instances of `client`.  Returns the PIDs a kill was
/// sent to.
pub fn kill_conflicting_client(client: &str) -> Vec<u32> {
    info!("looking for existing {} client", client);
    let pids = match list_locks().and_then(|json| Ok(conflicting_pids(&json, client)?)) {
        Ok(pids) => pids,
        Err(e) => {
            warn!("cannot look for {} clients: {}", client, e);
            return Vec::new();
        }
    };
    if pids.is_empty() {
        debug!("no {} client running", client);
    }

    pids.into_iter()
        .filter(|pid| {
            info!("killing {} client (pid {})", client, pid);
            match Command::new("kill").arg(pid.to_string()).status() {
                Ok(status) if status.success() => true,
                Ok(status) => {
                    warn!("kill {} exited with {}", pid, status);
                    false
                }
                Err(e) => {
                    warn!("failed to run kill for pid {}: {}", pid, e);
                    false
                }
            }
        })
        .collect()
}
