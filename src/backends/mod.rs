//! Device sources.
//!
//! A [`DeviceSource`] is the composition-time seam between the platform and the
//! [`InputManager`](crate::manager::InputManager). Each platform (or test harness)
//! registers one or more sources; the manager scans them once per tick, in registration
//! order, and applies the membership changes they report before polling devices.
//!
//! Sources never implement input semantics. They construct one of the capability devices
//! from [`crate::devices`], keep its sample sender, and hand the device over in a
//! [`SourceChange::Added`].
//!
//! [`virtual_input::VirtualSource`] is the in-process source used by tests, demos and
//! replay tooling.

use crate::device::{Device, DeviceId};
use std::time::Duration;

pub mod virtual_input;

pub use virtual_input::{VirtualSource, VirtualSourceHandle};

/// Membership change reported by a source.
pub enum SourceChange {
    Added(Box<dyn Device>),
    Removed(DeviceId),
}

impl std::fmt::Debug for SourceChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceChange::Added(device) => f.debug_tuple("Added").field(device.id()).finish(),
            SourceChange::Removed(id) => f.debug_tuple("Removed").field(id).finish(),
        }
    }
}

/// Reports devices appearing and disappearing.
pub trait DeviceSource: Send {
    /// Short name used in logs and [`DeviceIdentity::source`](crate::device::DeviceIdentity::source).
    fn name(&self) -> &str;

    /// Changes since the previous scan, oldest first.
    fn scan(&mut self, now: Duration) -> Vec<SourceChange>;
}
