//! Device identity and the [`Device`] trait.
//!
//! Every physical (or injected) input device is a boxed [`Device`] owned by exactly one
//! [`InputManager`](crate::manager::InputManager). Platform code never implements input
//! semantics itself: it picks one of the capability devices in [`crate::devices`], feeds
//! it raw samples, and hands it to the manager through a
//! [`DeviceSource`](crate::backends::DeviceSource).
//!
//! # Identity
//! - [`DeviceId`] is a short stable string (`"sim:keyboard"`, `"xinput:0"`, ...).
//!   It must be unique among the devices a manager owns; a clash is fatal.
//! - [`DeviceIdentity`] is the immutable descriptor the manager keeps behind an `Arc`.
//! - [`DeviceRef`] is what events carry: the id plus a `Weak` handle, so a queued
//!   event never keeps a removed device alive.

use crate::error::DeviceFault;
use crate::event::{ChannelDesc, InputKind};
use crate::metadata::DeviceMeta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Stable device identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a device can do. A device may report several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Keyboard,
    /// Reports pointer contacts (mouse cursor, touch, pen).
    Pointer,
    /// A mouse: buttons, wheel and a cursor.
    Mouse,
    GameController,
    Sensor,
}

/// Immutable descriptor of a registered device.
#[derive(Debug)]
pub struct DeviceIdentity {
    pub id: DeviceId,
    pub name: String,
    /// Name of the [`DeviceSource`](crate::backends::DeviceSource) that reported it.
    pub source: String,
    pub capabilities: Vec<Capability>,
    /// Channel descriptors, enumerated once at registration.
    pub channels: Vec<ChannelDesc>,
    pub meta: DeviceMeta,
}

impl DeviceIdentity {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) via {}", self.name, self.id, self.source)
    }
}

/// Non-owning reference from an event back to its device.
#[derive(Clone, Debug)]
pub struct DeviceRef {
    id: DeviceId,
    handle: Weak<DeviceIdentity>,
}

impl DeviceRef {
    pub(crate) fn new(identity: &Arc<DeviceIdentity>) -> Self {
        Self {
            id: identity.id.clone(),
            handle: Arc::downgrade(identity),
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// The device descriptor, if the device is still registered.
    pub fn upgrade(&self) -> Option<Arc<DeviceIdentity>> {
        self.handle.upgrade()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.strong_count() > 0
    }
}

impl PartialEq for DeviceRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Per-tick context handed to [`Device::poll`].
#[derive(Clone, Copy, Debug)]
pub struct PollCtx {
    /// Tick time on the manager's monotonic clock.
    pub now: Duration,
    /// Minimum change before an absolute axis reports a new value.
    pub axis_epsilon: f32,
}

/// A polled input device.
///
/// `poll` is called exactly once per tick by the manager. Implementations drain their
/// raw sample queue, run their state machines and return the resulting edges/changes.
/// Returning `Err` isolates this device for the tick; nothing it returned is applied.
pub trait Device: Send {
    fn poll(&mut self, ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault>;
    fn name(&self) -> &str;
    fn id(&self) -> &DeviceId;
    fn capabilities(&self) -> &[Capability];

    /// Channel descriptors (buttons, axes, hats). Queried once at registration.
    fn describe(&self) -> Vec<ChannelDesc> {
        Vec::new()
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::default()
    }
}
