use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current state of the supervisor cycle.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum DaemonState {
    /// Polling until both the event device and the xinput registration exist.
    AwaitingDevice,
    /// The event loop is running; button holds toggle natural scrolling.
    Toggling,
    /// The event loop exited; waiting out the restart cooldown.
    Cooldown,
}

/// Runtime status written by the daemon to ~/.local/state/dragscroll/status.toml
/// so the operator can see what the daemon is currently doing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DaemonStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// Current supervisor state.
    pub state: DaemonState,
    /// RFC 3339 timestamp of when the current state was entered.
    pub since: String,
}

impl DaemonStatus {
    /// Constructs the initial status on daemon startup.
    pub fn new() -> Self {
        Self::in_state(DaemonState::AwaitingDevice)
    }

    /// Constructs a status for `state`, stamped with the current time.
    pub fn in_state(state: DaemonState) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state,
            since: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Logs errors to stderr rather than panicking — a status write failure should
/// never take down the daemon.
pub fn write_status(path: &Path, status: &DaemonStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("[status] Failed to create directory {}: {e}", parent.display());
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                eprintln!("[status] Failed to write status file: {e}");
            }
        }
        Err(e) => eprintln!("[status] Failed to serialize status: {e}"),
    }
}
