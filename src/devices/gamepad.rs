//! Game controller device.
//!
//! The platform reports whole controller states ([`GamePadSample`]); the device diffs
//! them against its trackers so only changes become events.
//!
//! # Channel conventions
//! - Axes are normalized to `[-1.0, 1.0]`; triggers to `[0.0, 1.0]`.
//! - Buttons emit edge events (`Pressed` / `Released`).
//! - Hats emit `-1 | 0..7` (Up = 0, clockwise). [`hat_from_dpad`] maps four d-pad
//!   buttons to that convention.
//!
//! # Faults
//! A batch containing [`GamePadInput::ReadError`] or [`GamePadInput::Disconnected`]
//! makes the whole poll fail; none of the batch's states are applied. A single state
//! whose shape does not match the [`GamePadLayout`] is discarded with a warning.

use crate::device::{Capability, Device, DeviceId, PollCtx};
use crate::error::{DeviceFault, SampleError};
use crate::event::{ChannelDesc, InputKind};
use crate::metadata::DeviceMeta;
use crate::sample::{SampleQueue, SampleSender};
use crate::state::{AxisTracker, ButtonTracker};

/// Channel layout of an Xbox-style controller.
pub mod xbox {
    pub const A: u16 = 0;
    pub const B: u16 = 1;
    pub const X: u16 = 2;
    pub const Y: u16 = 3;
    pub const LEFT_SHOULDER: u16 = 4;
    pub const RIGHT_SHOULDER: u16 = 5;
    pub const BACK: u16 = 6;
    pub const START: u16 = 7;
    pub const LEFT_THUMB: u16 = 8;
    pub const RIGHT_THUMB: u16 = 9;

    pub const LEFT_X: u16 = 0;
    /// Inverted: up = -1, down = +1.
    pub const LEFT_Y: u16 = 1;
    pub const RIGHT_X: u16 = 2;
    pub const RIGHT_Y: u16 = 3;
    pub const LEFT_TRIGGER: u16 = 4;
    pub const RIGHT_TRIGGER: u16 = 5;

    pub const DPAD: u16 = 0;
}

/// One full controller state as read from the platform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GamePadSample {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    pub hats: Vec<i16>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GamePadInput {
    State(GamePadSample),
    ReadError(String),
    Disconnected,
}

/// Named channels of a controller model.
#[derive(Clone, Debug, PartialEq)]
pub struct GamePadLayout {
    pub buttons: Vec<String>,
    pub axes: Vec<String>,
    pub hats: Vec<String>,
}

impl GamePadLayout {
    pub fn xbox() -> Self {
        let names = |v: &[&str]| -> Vec<String> { v.iter().map(|s| s.to_string()).collect() };
        Self {
            buttons: names(&[
                "A", "B", "X", "Y", "LB", "RB", "Back", "Start", "LThumb", "RThumb",
            ]),
            axes: names(&["LX", "LY", "RX", "RY", "LT", "RT"]),
            hats: names(&["DPad"]),
        }
    }

    fn validate(&self, sample: &GamePadSample) -> Result<(), SampleError> {
        for (expected, actual) in [
            (self.buttons.len(), sample.buttons.len()),
            (self.axes.len(), sample.axes.len()),
            (self.hats.len(), sample.hats.len()),
        ] {
            if expected != actual {
                return Err(SampleError::WrongLength { expected, actual });
            }
        }
        for &value in &sample.axes {
            if !value.is_finite() {
                return Err(SampleError::NonFinite);
            }
            if !(-1.0..=1.0).contains(&value) {
                return Err(SampleError::OutOfRange {
                    value,
                    min: -1.0,
                    max: 1.0,
                });
            }
        }
        if let Some(&hat) = sample.hats.iter().find(|h| !(-1..=7).contains(*h)) {
            return Err(SampleError::OutOfRange {
                value: f32::from(hat),
                min: -1.0,
                max: 7.0,
            });
        }
        Ok(())
    }
}

/// Map d-pad buttons to the hat convention.
///
/// -1 = neutral, 0 = up, 1 = up-right, 2 = right, 3 = down-right,
/// 4 = down, 5 = down-left, 6 = left, 7 = up-left.
pub fn hat_from_dpad(up: bool, down: bool, left: bool, right: bool) -> i16 {
    match (up, down, left, right) {
        (true, false, false, false) => 0,
        (true, false, false, true) => 1,
        (false, false, false, true) => 2,
        (false, true, false, true) => 3,
        (false, true, false, false) => 4,
        (false, true, true, false) => 5,
        (false, false, true, false) => 6,
        (true, false, true, false) => 7,
        // Conflicting (up+down, left+right) or nothing held.
        _ => -1,
    }
}

/// Normalize a signed thumbstick reading into `[-1, 1]`.
#[inline]
pub fn normalize_thumb(v: i16) -> f32 {
    if v >= 0 {
        f32::from(v) / 32767.0
    } else {
        f32::from(v) / 32768.0
    }
}

/// Normalize an 8-bit trigger into `[0, 1]`.
#[inline]
pub fn normalize_trigger(v: u8) -> f32 {
    f32::from(v) / 255.0
}

pub struct GamePadDevice {
    id: DeviceId,
    name: String,
    layout: GamePadLayout,
    queue: SampleQueue<GamePadInput>,
    buttons: Vec<ButtonTracker>,
    axes: Vec<AxisTracker>,
    hats: Vec<i16>,
}

impl GamePadDevice {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, layout: GamePadLayout) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            buttons: vec![ButtonTracker::default(); layout.buttons.len()],
            axes: vec![AxisTracker::absolute(); layout.axes.len()],
            hats: vec![-1; layout.hats.len()],
            layout,
            queue: SampleQueue::new(),
        }
    }

    pub fn sender(&self) -> SampleSender<GamePadInput> {
        self.queue.sender()
    }

    pub fn layout(&self) -> &GamePadLayout {
        &self.layout
    }

    fn apply(&mut self, sample: &GamePadSample, epsilon: f32, out: &mut Vec<InputKind>) {
        for (i, &v) in sample.axes.iter().enumerate() {
            if let Some(value) = self.axes[i].sample(v, epsilon) {
                out.push(InputKind::AxisMoved {
                    axis: i as u16,
                    value,
                    kind: self.axes[i].kind(),
                });
            }
        }
        for (i, &down) in sample.buttons.iter().enumerate() {
            if let Some(edge) = self.buttons[i].sample(down) {
                out.push(InputKind::GamePadButton {
                    button: i as u16,
                    edge,
                });
            }
        }
        for (i, &value) in sample.hats.iter().enumerate() {
            if self.hats[i] != value {
                self.hats[i] = value;
                out.push(InputKind::HatChanged {
                    hat: i as u16,
                    value,
                });
            }
        }
    }
}

impl Device for GamePadDevice {
    fn poll(&mut self, ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault> {
        let batch = self.queue.drain();

        for input in &batch {
            match input {
                GamePadInput::ReadError(msg) => return Err(DeviceFault::Read(msg.clone())),
                GamePadInput::Disconnected => return Err(DeviceFault::Disconnected),
                GamePadInput::State(_) => {}
            }
        }

        let mut out = Vec::new();
        for input in batch {
            let GamePadInput::State(sample) = input else {
                continue;
            };
            match self.layout.validate(&sample) {
                Ok(()) => self.apply(&sample, ctx.axis_epsilon, &mut out),
                Err(err) => {
                    tracing::warn!(device = %self.id, %err, "discarding malformed gamepad sample");
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::GameController]
    }

    fn describe(&self) -> Vec<ChannelDesc> {
        let mut out = Vec::new();
        for (i, name) in self.layout.axes.iter().enumerate() {
            out.push(ChannelDesc::axis(i as u16, name, -1, 1));
        }
        for (i, name) in self.layout.buttons.iter().enumerate() {
            out.push(ChannelDesc::button(i as u16, name));
        }
        for (i, name) in self.layout.hats.iter().enumerate() {
            out.push(ChannelDesc::hat(i as u16, name));
        }
        out
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::named(self.name.clone())
    }
}
