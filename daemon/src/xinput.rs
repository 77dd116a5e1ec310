/// Process-invocation boundary to the X input subsystem.
///
/// All property reads and writes go through the `xinput` command-line tool;
/// the daemon never links against X directly. The two capability traits keep
/// the rest of the daemon testable without spawning real processes.
use anyhow::{bail, Context, Result};
use std::process::Command;

pub const PROP_SCROLL_BUTTON: &str = "libinput Button Scrolling Button";
pub const PROP_SCROLL_METHOD: &str = "libinput Scroll Method Enabled";
pub const PROP_NATURAL_SCROLL: &str = "libinput Natural Scrolling Enabled";

/// Lists the devices registered with the input subsystem.
pub trait DeviceQuery {
    /// Returns the raw text of the device listing.
    fn list_devices(&self) -> Result<String>;
}

/// Writes one device property in the input subsystem.
pub trait PropertySetter {
    fn set_prop(&self, device_id: u32, property: &str, values: &[&str]) -> Result<()>;
}

/// Production implementation shelling out to `xinput`.
pub struct XinputCli;

impl DeviceQuery for XinputCli {
    fn list_devices(&self) -> Result<String> {
        let output = Command::new("xinput")
            .arg("list")
            .output()
            .context("Failed to run `xinput list`")?;
        if !output.status.success() {
            bail!("`xinput list` exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PropertySetter for XinputCli {
    fn set_prop(&self, device_id: u32, property: &str, values: &[&str]) -> Result<()> {
        let status = Command::new("xinput")
            .arg("set-prop")
            .arg(device_id.to_string())
            .arg(property)
            .args(values)
            .status()
            .with_context(|| format!("Failed to run `xinput set-prop` for {property:?}"))?;
        if !status.success() {
            bail!("`xinput set-prop {device_id} {property:?}` exited with {status}");
        }
        Ok(())
    }
}
