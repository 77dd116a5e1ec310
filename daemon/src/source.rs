use anyhow::{Context, Result};
use evdev::{Device, InputEvent};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// A lazy, non-restartable sequence of structured input events.
///
/// `next_batch` returns the pending events in arrival order, an error of kind
/// `WouldBlock` when nothing is pending yet, or any other error when the
/// device is gone. The underlying handle is released when the source is
/// dropped, on every exit path of the consumer.
pub trait EventSource {
    fn next_batch(&mut self) -> io::Result<Vec<InputEvent>>;
}

/// Event source backed by a /dev/input/eventN character device.
pub struct EvdevSource {
    device: Device,
}

impl EvdevSource {
    /// Opens `path` and puts the descriptor in non-blocking mode so the read
    /// loop can observe its stop signal between batches.
    pub fn open(path: &Path) -> Result<Self> {
        let device = Device::open(path)
            .with_context(|| format!("Failed to open event device {}", path.display()))?;
        set_nonblocking(&device)
            .with_context(|| format!("Failed to set {} non-blocking", path.display()))?;
        Ok(Self { device })
    }
}

impl EventSource for EvdevSource {
    fn next_batch(&mut self) -> io::Result<Vec<InputEvent>> {
        Ok(self.device.fetch_events()?.collect())
    }
}

fn set_nonblocking(device: &Device) -> io::Result<()> {
    let fd = device.as_raw_fd();

    // Preserve existing flags; just OR in O_NONBLOCK.
    let current = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if current < 0 {
        return Err(io::Error::last_os_error());
    }
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
