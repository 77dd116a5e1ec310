use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::event::DaemonEvent;
use crate::toggler;

pub const DEFAULT_BUTTON: &str = "right";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_COOLDOWN_SECS: u64 = 3;

/// Root configuration structure. Deserialized from ~/.config/dragscroll/config.toml.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Identifies the physical pointing device under both input stacks.
///
/// Both ids must refer to the same device; the daemon has no way to verify
/// the correspondence.
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Numeral N of the /dev/input/eventN character device. Find yours with `sudo evtest`.
    pub event_device: u32,
    /// X input subsystem device id. Find yours with `xinput list`.
    pub xinput_id: u32,
    /// Name of the button held for drag scrolling (e.g. "right", "middle", "side").
    #[serde(default = "default_button")]
    pub button: String,
}

/// Timing knobs for the readiness polls and the restart cooldown.
#[derive(Debug, Deserialize, Clone)]
pub struct DaemonConfig {
    /// Seconds between readiness-poll attempts.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Seconds to wait before restarting the cycle after the event loop exits.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl DeviceConfig {
    /// Filesystem path of the event device, derived from the configured numeral.
    pub fn event_path(&self) -> PathBuf {
        PathBuf::from(format!("/dev/input/event{}", self.event_device))
    }
}

/// Loads and validates the config file at `path`.
///
/// Unlike timing knobs, the device ids are machine-specific and have no
/// sensible default, so a missing file is an error rather than an implicit
/// default config.
pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file {} (expected keys: [device] event_device, xinput_id, button)",
            path.display()
        )
    })?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    toggler::parse_button(&config.device.button).with_context(|| {
        format!(
            "Unknown button name {:?} in {}",
            config.device.button,
            path.display()
        )
    })?;
    Ok(config)
}

/// Spawns a file watcher on the parent directory of `path`.  Whenever the config
/// file is created or modified and re-parses as a valid config, sends a
/// `ConfigReloaded` event.  Invalid reloads are logged and ignored so a half-saved
/// edit never takes down the running configuration.
pub async fn watch_config(path: PathBuf, tx: mpsc::Sender<DaemonEvent>) {
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("[config] Failed to create file watcher: {e}");
            return;
        }
    };

    // Watch the parent directory rather than the file directly so we catch
    // editor-style atomic saves (write-new + rename).
    let watch_dir = match path.parent() {
        Some(d) => d.to_path_buf(),
        None => {
            eprintln!("[config] Config path has no parent directory");
            return;
        }
    };

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        eprintln!("[config] Failed to watch config directory: {e}");
        return;
    }

    while let Some(event) = watch_rx.recv().await {
        let affects_config = event.paths.iter().any(|p| p == path.as_path());
        let is_write = matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        );

        if affects_config && is_write {
            match load(&path) {
                Ok(config) => {
                    if tx.send(DaemonEvent::ConfigReloaded(config)).await.is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("[config] Ignoring config reload: {e:#}"),
            }
        }
    }
}

fn default_button() -> String {
    DEFAULT_BUTTON.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN_SECS
}
