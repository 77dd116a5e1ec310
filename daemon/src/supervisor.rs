/// The wait → toggle → cooldown cycle, run as an owned background task.
///
/// A `Supervisor` owns the spawned cycle and the stop signal for it:
/// `start` spawns, `stop` signals and joins.  The cycle itself is an
/// unconditionally infinite state machine
/// AwaitingDevice → Toggling → Cooldown → AwaitingDevice → …;
/// only the stop signal exits it.
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::monitor::{self, RetryPolicy};
use crate::source::EvdevSource;
use crate::status::{self, DaemonState, DaemonStatus};
use crate::toggler::{self, ButtonSpec};
use crate::xinput::XinputCli;

pub struct Supervisor {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Supervisor {
    /// Spawns the supervisor cycle for `config`.
    /// `button` must be the parsed form of `config.device.button`.
    pub fn start(config: Config, button: ButtonSpec, status_path: PathBuf) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run(config, button, status_path, stop_rx));
        Self { stop_tx, handle }
    }

    /// Signals the cycle to stop and waits for the task to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn run(
    config: Config,
    button: ButtonSpec,
    status_path: PathBuf,
    mut stop: watch::Receiver<bool>,
) {
    let policy = RetryPolicy::new(Duration::from_secs(config.daemon.poll_interval_secs));
    let cooldown = Duration::from_secs(config.daemon.cooldown_secs);
    let event_path = config.device.event_path();
    let xinput_id = config.device.xinput_id;

    loop {
        status::write_status(&status_path, &DaemonStatus::in_state(DaemonState::AwaitingDevice));
        if !monitor::wait_until_ready(&event_path, xinput_id, &XinputCli, &policy, &mut stop).await
        {
            return;
        }

        toggler::configure_drag_scroll(&XinputCli, xinput_id, &button);

        status::write_status(&status_path, &DaemonStatus::in_state(DaemonState::Toggling));
        let toggle_stop = stop.clone();
        let path = event_path.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let source = match EvdevSource::open(&path) {
                Ok(source) => source,
                Err(e) => {
                    // Open failure aborts this invocation; the cycle retries
                    // after the cooldown.
                    eprintln!("[supervisor] {e:#}");
                    return;
                }
            };
            let _ = toggler::run(source, &XinputCli, xinput_id, &button, &toggle_stop);
        })
        .await;
        if let Err(e) = joined {
            eprintln!("[supervisor] Toggler task failed: {e}");
        }

        if *stop.borrow() {
            return;
        }

        status::write_status(&status_path, &DaemonStatus::in_state(DaemonState::Cooldown));
        tokio::select! {
            _ = tokio::time::sleep(cooldown) => {}
            _ = stop.changed() => return,
        }
    }
}
