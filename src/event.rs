//! Events and channel descriptions.
//!
//! Devices report changes as small, device-agnostic deltas ([`InputKind`]). The manager
//! stamps each one with its device, tick time and tick-local position, producing an
//! immutable [`InputEvent`].
//!
//! ## Value conventions
//! - **Gamepad axes:** normalized to `[-1.0, 1.0]`.
//! - **Buttons/keys:** edge events only (`Pressed` / `Released`), never one per held tick.
//! - **Hats (POV/D-pad):** `-1` = neutral, `0..7` = 8-way directions (Up = 0, clockwise).
//! - **Relative axes** (mouse X/Y/wheel) carry the movement accumulated this tick;
//!   **absolute axes** carry the latest raw value.
//! - **Pointer positions:** normalized surface coordinates.
//!
//! ## Ordering
//! Within one tick's list, every [`InputKind::DeviceChanged`] comes first. The remaining
//! events are sorted by `time`; events for the same control keep their emission order.

use crate::device::DeviceRef;
use crate::devices::keyboard::Key;
use crate::devices::mouse::MouseButton;
use crate::devices::sensor::{SensorKind, SensorReading};
use crate::gesture::GestureEvent;
use crate::pointer::PointerEvent;
use crate::state::AxisKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Button transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// Device membership change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceChange {
    Added,
    Removed,
}

/// Per-device input change.
#[derive(Clone, Debug, PartialEq)]
pub enum InputKind {
    /// A keyboard key changed state.
    Key { key: Key, edge: ButtonEdge },

    /// Text produced by the keyboard (layout/IME aware, already composed).
    TextInput { text: String },

    MouseButton { button: MouseButton, edge: ButtonEdge },

    /// Wheel movement accumulated this tick, in notches.
    MouseWheel { delta: f32 },

    /// A continuous channel changed.
    AxisMoved { axis: u16, value: f32, kind: AxisKind },

    /// A pointer contact began, moved or ended.
    Pointer(PointerEvent),

    /// A gamepad button transitioned. `button` is the device-local index.
    GamePadButton { button: u16, edge: ButtonEdge },

    /// A hat (POV/D-pad) changed.
    ///
    /// `value`: `-1` = neutral, `0..7` = directions (Up = 0, clockwise).
    HatChanged { hat: u16, value: i16 },

    Gesture(GestureEvent),

    /// A sensor produced a new reading. `None` means the reading was cleared
    /// because the sensor was disabled.
    SensorChanged {
        sensor: SensorKind,
        reading: Option<SensorReading>,
    },

    DeviceChanged { change: DeviceChange },
}

impl InputKind {
    pub fn is_button(&self) -> bool {
        matches!(
            self,
            InputKind::Key { .. } | InputKind::MouseButton { .. } | InputKind::GamePadButton { .. }
        )
    }

    pub fn is_axis(&self) -> bool {
        matches!(
            self,
            InputKind::AxisMoved { .. } | InputKind::MouseWheel { .. } | InputKind::HatChanged { .. }
        )
    }
}

/// Input change captured by the manager during one tick.
///
/// Fields are read-only; events are built once by the manager and never mutated.
#[derive(Clone, Debug)]
pub struct InputEvent {
    device: DeviceRef,
    seq: u64,
    time: Duration,
    kind: InputKind,
}

impl InputEvent {
    pub(crate) fn new(device: DeviceRef, seq: u64, time: Duration, kind: InputKind) -> Self {
        Self {
            device,
            seq,
            time,
            kind,
        }
    }

    /// Originating device (weak).
    pub fn device(&self) -> &DeviceRef {
        &self.device
    }

    /// Position of this event in the tick's list, starting at 0.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Capture time on the manager's monotonic clock.
    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn kind(&self) -> &InputKind {
        &self.kind
    }
}

/// Category of an input channel on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Axis,
    Button,
    Hat,
}

/// Describes a channel exposed by a device.
///
/// Devices populate this at construction so UIs and binding systems can present stable
/// channel names and ranges. The same descriptor set is returned for the whole device
/// lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelDesc {
    /// Channel category.
    pub kind: ChannelKind,
    /// Device-local channel index (matches indices used in [`InputKind`]).
    pub idx: u16,
    /// Optional human-friendly name (e.g. `"LX"`, `"A"`, `"DPad"`).
    pub name: Option<String>,
    /// Logical minimum of reported values.
    pub logical_min: i32,
    /// Logical maximum of reported values.
    pub logical_max: i32,
}

impl ChannelDesc {
    pub fn button(idx: u16, name: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Button,
            idx,
            name: Some(name.into()),
            logical_min: 0,
            logical_max: 1,
        }
    }

    pub fn axis(idx: u16, name: impl Into<String>, logical_min: i32, logical_max: i32) -> Self {
        Self {
            kind: ChannelKind::Axis,
            idx,
            name: Some(name.into()),
            logical_min,
            logical_max,
        }
    }

    pub fn hat(idx: u16, name: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Hat,
            idx,
            name: Some(name.into()),
            logical_min: -1,
            logical_max: 7,
        }
    }
}
