mod config;
mod event;
mod monitor;
mod paths;
mod source;
mod status;
mod supervisor;
mod toggler;
mod xinput;

use tokio::sync::mpsc;

use crate::event::DaemonEvent;
use crate::supervisor::Supervisor;

#[tokio::main]
async fn main() {
    // ── Configuration ─────────────────────────────────────────────────────────
    let config_dir = paths::config_dir();
    if let Err(e) = std::fs::create_dir_all(&config_dir) {
        eprintln!("Failed to create config directory {}: {e}", config_dir.display());
        std::process::exit(1);
    }

    let config_path = paths::config_file_path();
    let mut config = match config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[config] Error: {e:#}");
            std::process::exit(1);
        }
    };
    let button = match toggler::parse_button(&config.device.button) {
        Some(b) => b,
        None => {
            eprintln!("[config] Unknown button name: {:?}", config.device.button);
            std::process::exit(1);
        }
    };

    // ── Initial status ────────────────────────────────────────────────────────
    let status_path = paths::status_file_path();
    status::write_status(&status_path, &status::DaemonStatus::new());

    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(32);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path, event_tx.clone()));

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(DaemonEvent::Shutdown).await;
            }
        });
    }

    println!("dragscroll-daemon v{} started", env!("CARGO_PKG_VERSION"));

    // ── Event loop ────────────────────────────────────────────────────────────
    let mut sup = Supervisor::start(config.clone(), button, status_path.clone());

    while let Some(evt) = event_rx.recv().await {
        match evt {
            DaemonEvent::ConfigReloaded(new_config) => {
                let new_button = match toggler::parse_button(&new_config.device.button) {
                    Some(b) => b,
                    None => {
                        // watch_config validates before sending, so this only
                        // guards against a racing edit.
                        eprintln!(
                            "[config] Unknown button {:?} in reloaded config; keeping current settings",
                            new_config.device.button
                        );
                        continue;
                    }
                };

                println!("Config reloaded");
                sup.stop().await;
                config = new_config;
                sup = Supervisor::start(config.clone(), new_button, status_path.clone());
            }

            DaemonEvent::Shutdown => {
                println!("Shutting down");
                sup.stop().await;
                break;
            }
        }
    }
}
