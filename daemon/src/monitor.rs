use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

use crate::xinput::DeviceQuery;

/// How often the readiness probes re-run and how often they report progress.
/// Attempts are unbounded; the daemon is meant to outlive device hot-plug
/// cycles.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay between probe attempts.
    pub interval: Duration,
    /// A "still waiting" notice is printed every this many failed attempts.
    pub notice_every: u32,
}

impl RetryPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            notice_every: 10,
        }
    }
}

/// Blocks until both device handles are observable or the stop signal fires.
///
/// The event device must be confirmed present before xinput polling begins.
/// Returns false if stopped before both became ready.
pub async fn wait_until_ready(
    event_path: &Path,
    xinput_id: u32,
    query: &(dyn DeviceQuery + Sync),
    policy: &RetryPolicy,
    stop: &mut watch::Receiver<bool>,
) -> bool {
    if !await_event_device(event_path, policy, stop).await {
        return false;
    }
    await_xinput_device(xinput_id, query, policy, stop).await
}

/// Polls for filesystem existence of the event device.
pub async fn await_event_device(
    path: &Path,
    policy: &RetryPolicy,
    stop: &mut watch::Receiver<bool>,
) -> bool {
    let waiting = format!("Event device {} is not available yet", path.display());
    let ready = poll_until(policy, stop, || path.exists(), &waiting).await;
    if ready {
        println!("[monitor] Event device {} is available.", path.display());
    }
    ready
}

/// Polls the device listing until it contains an `id=<n>` entry for `id`.
///
/// A failed listing (spawn or exit failure) counts as "not yet available"
/// rather than fatal; the wait continues.
pub async fn await_xinput_device(
    id: u32,
    query: &(dyn DeviceQuery + Sync),
    policy: &RetryPolicy,
    stop: &mut watch::Receiver<bool>,
) -> bool {
    let needle = format!("id={id}");
    let waiting = format!("xinput device {id} is not available yet");
    let ready = poll_until(
        policy,
        stop,
        || match query.list_devices() {
            Ok(listing) => listing.contains(&needle),
            Err(e) => {
                eprintln!("[monitor] Device listing failed: {e:#}");
                false
            }
        },
        &waiting,
    )
    .await;
    if ready {
        println!("[monitor] xinput device {id} is available.");
    }
    ready
}

/// Probes at the policy's fixed interval until `probe` succeeds or the stop
/// signal fires. Every `notice_every`-th failed attempt prints `waiting_msg`.
async fn poll_until(
    policy: &RetryPolicy,
    stop: &mut watch::Receiver<bool>,
    mut probe: impl FnMut() -> bool,
    waiting_msg: &str,
) -> bool {
    let mut attempts: u32 = 0;
    loop {
        if *stop.borrow() {
            return false;
        }
        if probe() {
            return true;
        }
        if attempts % policy.notice_every == 0 {
            println!("[monitor] {waiting_msg}. Waiting...");
        }
        attempts = attempts.wrapping_add(1);
        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = stop.changed() => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    /// Always answers with the same listing, counting the calls.
    struct FixedQuery {
        listing: &'static str,
        calls: AtomicUsize,
    }

    impl FixedQuery {
        fn new(listing: &'static str) -> Self {
            Self {
                listing,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DeviceQuery for FixedQuery {
        fn list_devices(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.listing.to_string())
        }
    }

    /// Fails the first `failures` calls, then answers with the listing.
    struct FlakyQuery {
        listing: &'static str,
        failures: usize,
        calls: AtomicUsize,
    }

    impl DeviceQuery for FlakyQuery {
        fn list_devices(&self) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                bail!("simulated spawn failure");
            }
            Ok(self.listing.to_string())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(1))
    }

    // ── poll_until ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn poll_until_returns_once_the_probe_succeeds() {
        let (_tx, mut stop) = watch::channel(false);
        let mut attempts = 0;
        let ready = poll_until(
            &fast_policy(),
            &mut stop,
            || {
                attempts += 1;
                attempts >= 3
            },
            "probe",
        )
        .await;
        assert!(ready);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn poll_until_respects_a_pre_set_stop_signal() {
        let (tx, mut stop) = watch::channel(false);
        tx.send(true).unwrap();
        let ready = poll_until(&fast_policy(), &mut stop, || panic!("must not probe"), "probe").await;
        assert!(!ready);
    }

    #[tokio::test]
    async fn poll_until_stops_mid_wait() {
        let (tx, mut stop) = watch::channel(false);
        let policy = RetryPolicy::new(Duration::from_secs(60));
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let _ = tx.send(true);
        });

        // The first attempt fails and the poll enters its long sleep; the stop
        // signal must end the wait without riding out the interval.
        let ready = timeout(
            Duration::from_secs(1),
            poll_until(&policy, &mut stop, || false, "probe"),
        )
        .await
        .expect("stop signal did not end the wait");
        assert!(!ready);
    }

    // ── await_xinput_device ───────────────────────────────────────────────────

    #[tokio::test]
    async fn xinput_wait_ends_the_moment_the_id_appears() {
        let (_tx, mut stop) = watch::channel(false);
        let query = FixedQuery::new("Virtual core pointer  id=24  [master pointer]");
        let ready = await_xinput_device(24, &query, &fast_policy(), &mut stop).await;
        assert!(ready);
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn xinput_wait_keeps_polling_while_the_id_is_absent() {
        let (_tx, mut stop) = watch::channel(false);
        let query = FixedQuery::new("Virtual core pointer  id=2  [master pointer]");
        let result = timeout(
            Duration::from_millis(20),
            await_xinput_device(24, &query, &fast_policy(), &mut stop),
        )
        .await;
        assert!(result.is_err(), "id=2 must not satisfy a wait for id=24");
        assert!(query.calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn xinput_wait_treats_query_failure_as_not_yet_available() {
        let (_tx, mut stop) = watch::channel(false);
        let query = FlakyQuery {
            listing: "pointer  id=24",
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let ready = await_xinput_device(24, &query, &fast_policy(), &mut stop).await;
        assert!(ready);
        assert_eq!(query.calls.load(Ordering::SeqCst), 3);
    }

    // ── wait_until_ready ordering ─────────────────────────────────────────────

    #[tokio::test]
    async fn xinput_is_not_queried_while_the_event_device_is_missing() {
        let (_tx, mut stop) = watch::channel(false);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("event27");
        let query = FixedQuery::new("pointer  id=24");

        let result = timeout(
            Duration::from_millis(20),
            wait_until_ready(&missing, 24, &query, &fast_policy(), &mut stop),
        )
        .await;
        assert!(result.is_err(), "must keep waiting for the event device");
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn both_handles_present_completes_the_wait() {
        let (_tx, mut stop) = watch::channel(false);
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("event27");
        std::fs::write(&present, b"").unwrap();
        let query = FixedQuery::new("pointer  id=24");

        let ready = wait_until_ready(&present, 24, &query, &fast_policy(), &mut stop).await;
        assert!(ready);
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);
    }
}
