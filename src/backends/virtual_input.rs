//! In-process device source.
//!
//! [`VirtualSource`] is registered with the manager like any platform source; the
//! matching [`VirtualSourceHandle`] can be cloned and kept by test code or a replay tool
//! to plug devices in and out from anywhere, including other threads.
//!
//! ```ignore
//! let (source, handle) = VirtualSource::new("sim");
//! manager.add_source(source);
//!
//! let keyboard = KeyboardDevice::new("sim:kbd", "Simulated keyboard");
//! let keys = keyboard.sender();
//! handle.add_device(keyboard);
//! keys.send(KeyboardSample::Down(Key::Space));
//! ```

use super::{DeviceSource, SourceChange};
use crate::device::{Device, DeviceId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub struct VirtualSource {
    name: String,
    pending: Arc<Mutex<Vec<SourceChange>>>,
}

/// Producer side of a [`VirtualSource`]. Cheap to clone.
#[derive(Clone)]
pub struct VirtualSourceHandle {
    pending: Arc<Mutex<Vec<SourceChange>>>,
}

impl VirtualSource {
    pub fn new(name: impl Into<String>) -> (Self, VirtualSourceHandle) {
        let pending = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name: name.into(),
                pending: Arc::clone(&pending),
            },
            VirtualSourceHandle { pending },
        )
    }
}

impl VirtualSourceHandle {
    /// Plug a device in; it is registered on the next tick.
    pub fn add_device<D: Device + 'static>(&self, device: D) {
        self.pending.lock().push(SourceChange::Added(Box::new(device)));
    }

    pub fn add_boxed(&self, device: Box<dyn Device>) {
        self.pending.lock().push(SourceChange::Added(device));
    }

    /// Unplug a device; it is removed on the next tick.
    pub fn remove_device(&self, id: impl Into<DeviceId>) {
        self.pending.lock().push(SourceChange::Removed(id.into()));
    }
}

impl DeviceSource for VirtualSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&mut self, _now: Duration) -> Vec<SourceChange> {
        std::mem::take(&mut *self.pending.lock())
    }
}
