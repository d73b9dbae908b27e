use crate::keybinding::{KeyEvent, Modifiers};
use anyhow::{Context, Result};
use evdev::{Device, InputEventKind, Key};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// evdev value for a key press; 0 is release and 2 autorepeat.
const KEY_PRESSED: i32 = 1;
const KEY_RELEASED: i32 = 0;

pub struct KeyboardMonitor {
    device: Device,
    tracker: ModifierTracker,
}

impl KeyboardMonitor {
    /// Open `path`, or find a keyboard device when no path is given
    pub fn new(path: Option<&str>) -> Result<Self> {
        let device = match path {
            Some(path) => Device::open(path).with_context(|| format!("Failed to open {}", path))?,
            None => Self::find_keyboard_device().context("Failed to find keyboard device")?,
        };

        info!("Using keyboard device: {:?}", device.name());

        Ok(KeyboardMonitor {
            device,
            tracker: ModifierTracker::default(),
        })
    }

    /// Find a suitable keyboard device from /dev/input/event*
    fn find_keyboard_device() -> Result<Device> {
        for (_, device) in evdev::enumerate() {
            if let Some(keys) = device.supported_keys() {
                if keys.contains(Key::KEY_LEFTALT)
                    && keys.contains(Key::KEY_TAB)
                    && keys.contains(Key::KEY_LEFTSHIFT)
                {
                    debug!("Found suitable keyboard: {:?}", device.name());
                    return Ok(device);
                }
            }
        }

        anyhow::bail!("No suitable keyboard device found. Make sure you have permission to read /dev/input/event* devices.")
    }

    /// Start monitoring keyboard events and send them through the channel
    /// This runs in a blocking thread and communicates via the channel
    pub fn monitor_blocking(mut self, tx: mpsc::UnboundedSender<KeyEvent>) -> Result<()> {
        info!("Starting keyboard monitoring");

        loop {
            let mut batch = Vec::new();
            match self.device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        if let InputEventKind::Key(key) = event.kind() {
                            batch.push((format!("{:?}", key), event.value()));
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No events available, sleep briefly
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
                Err(e) => return Err(e.into()),
            }

            for (name, value) in batch {
                if let Some(event) = self.tracker.translate(&name, value) {
                    if tx.send(event).is_err() {
                        warn!("Failed to send key event, receiver dropped");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Modifier state reconstructed from raw key transitions.
#[derive(Debug, Default)]
struct ModifierTracker {
    held: Modifiers,
}

impl ModifierTracker {
    /// Turn a raw transition into a KeyEvent carrying the modifiers held
    /// before it. Autorepeat is dropped.
    fn translate(&mut self, key: &str, value: i32) -> Option<KeyEvent> {
        let modifier = Modifiers::from_key(key);
        match value {
            KEY_PRESSED => {
                let event = KeyEvent::pressed(key, self.held);
                self.held |= modifier;
                Some(event)
            }
            KEY_RELEASED => {
                self.held -= modifier;
                Some(KeyEvent::released(key, self.held))
            }
            _ => None,
        }
    }
}

/// Check if the current user has permission to read keyboard devices
pub fn check_permissions(path: Option<&str>) -> Result<()> {
    match KeyboardMonitor::new(path) {
        Ok(_) => {
            info!("Keyboard device access OK");
            Ok(())
        }
        Err(e) => {
            eprintln!("ERROR: Cannot access keyboard devices.");
            eprintln!("--input=evdev needs permission to read /dev/input/event* devices.");
            eprintln!("\nTo fix this, add your user to the 'input' group:");
            eprintln!("  sudo usermod -aG input $USER");
            eprintln!("  (then log out and log back in)");
            eprintln!("\nOr use the default --input=ipc with sway bindings instead.");
            Err(e)
        }
    }
}
