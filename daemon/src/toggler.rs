/// Button-edge scroll toggler.
///
/// Holds of the configured button enable natural scrolling for the xinput
/// device, releases disable it.  The detector reacts to press/release edges
/// only; auto-repeat and duplicate events are no-ops.
use evdev::{InputEvent, InputEventKind, Key};
use std::io;
use std::time::Duration;
use tokio::sync::watch;

use crate::source::EventSource;
use crate::xinput::{
    PropertySetter, PROP_NATURAL_SCROLL, PROP_SCROLL_BUTTON, PROP_SCROLL_METHOD,
};

/// `libinput Scroll Method Enabled` bitmask (two-finger, edge, button)
/// selecting button scrolling.
const SCROLL_METHOD_BUTTON: [&str; 3] = ["0", "0", "1"];

/// Sleep between polls while the device has no pending events.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// The designated drag-scroll button under both input stacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonSpec {
    /// Key code reported by the event device.
    pub key: Key,
    /// Button number used by `xinput set-prop`.
    pub xinput_button: u8,
}

/// Converts a button name from the config file into a [`ButtonSpec`].
///
/// Supported names (case-insensitive):
/// - `"left"`, `"middle"`, `"right"` — the main buttons.
/// - `"side"` / `"back"` and `"extra"` / `"forward"` — the thumb buttons.
///
/// Returns `None` for any unrecognised name.
pub fn parse_button(name: &str) -> Option<ButtonSpec> {
    let spec = match name.to_ascii_lowercase().as_str() {
        "left" => ButtonSpec { key: Key::BTN_LEFT, xinput_button: 1 },
        "middle" => ButtonSpec { key: Key::BTN_MIDDLE, xinput_button: 2 },
        "right" => ButtonSpec { key: Key::BTN_RIGHT, xinput_button: 3 },
        "side" | "back" => ButtonSpec { key: Key::BTN_SIDE, xinput_button: 8 },
        "extra" | "forward" => ButtonSpec { key: Key::BTN_EXTRA, xinput_button: 9 },
        _ => return None,
    };
    Some(spec)
}

/// Designates `button` as the scroll-trigger for the device and switches the
/// device's scroll method to button scrolling.
///
/// Best-effort: each failure is logged and the daemon proceeds regardless.
pub fn configure_drag_scroll(setter: &dyn PropertySetter, xinput_id: u32, button: &ButtonSpec) {
    let button_value = button.xinput_button.to_string();
    if let Err(e) = setter.set_prop(xinput_id, PROP_SCROLL_BUTTON, &[button_value.as_str()]) {
        eprintln!("[toggler] Failed to set scroll button: {e:#}");
    }
    if let Err(e) = setter.set_prop(xinput_id, PROP_SCROLL_METHOD, &SCROLL_METHOD_BUTTON) {
        eprintln!("[toggler] Failed to enable button scrolling: {e:#}");
    }
}

/// Flips the external natural-scrolling property.
///
/// Failure is logged and does not touch the tracked button state; the local
/// and external state may diverge until the next edge.
pub fn set_natural_scroll(setter: &dyn PropertySetter, xinput_id: u32, enabled: bool) {
    let value = if enabled { "1" } else { "0" };
    if let Err(e) = setter.set_prop(xinput_id, PROP_NATURAL_SCROLL, &[value]) {
        eprintln!("[toggler] Failed to set natural scrolling to {value}: {e:#}");
    }
}

/// Debounced press/release edge detector for one button.
///
/// Starts released. [`observe`](Self::observe) returns `Some(pressed)` only on
/// a state transition; repeats of the current state (evdev auto-repeat sends
/// value 2 while held) and all unrelated events return `None`.
#[derive(Debug)]
pub struct EdgeDetector {
    key: Key,
    pressed: bool,
}

impl EdgeDetector {
    pub fn new(key: Key) -> Self {
        Self { key, pressed: false }
    }

    pub fn observe(&mut self, event: &InputEvent) -> Option<bool> {
        match event.kind() {
            InputEventKind::Key(key) if key == self.key => {}
            _ => return None,
        }
        let pressed = event.value() > 0;
        if pressed == self.pressed {
            return None;
        }
        self.pressed = pressed;
        Some(pressed)
    }
}

/// Runs the edge-detector loop until the source errors out or `stop` fires.
///
/// Batches are processed in read order and events within a batch in arrival
/// order; each edge of the configured button flips the natural-scrolling
/// property. The event source is dropped, releasing its device handle, on
/// every exit path.
pub fn run(
    mut source: impl EventSource,
    setter: &dyn PropertySetter,
    xinput_id: u32,
    button: &ButtonSpec,
    stop: &watch::Receiver<bool>,
) -> io::Result<()> {
    let mut detector = EdgeDetector::new(button.key);
    println!("[toggler] Listening for button events...");

    loop {
        if *stop.borrow() {
            return Ok(());
        }
        match source.next_batch() {
            Ok(events) => {
                for event in &events {
                    if let Some(pressed) = detector.observe(event) {
                        set_natural_scroll(setter, xinput_id, pressed);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::sleep(IDLE_POLL),
            Err(e) => {
                eprintln!("[toggler] Event read failed: {e}");
                return Err(e);
            }
        }
    }
}
