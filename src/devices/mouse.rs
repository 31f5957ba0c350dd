//! Mouse device.
//!
//! A mouse reports on three surfaces at once:
//! - buttons, as [`MouseButton`] edges;
//! - raw movement, as the relative axes [`axis::X`] / [`axis::Y`] plus the wheel;
//! - the cursor, as pointer contact `0` of type [`PointerType::Mouse`], which begins on
//!   the first reported position and ends when the cursor leaves the surface.

use crate::device::{Capability, Device, DeviceId, PollCtx};
use crate::error::DeviceFault;
use crate::event::{ChannelDesc, InputKind};
use crate::math::Vec2;
use crate::metadata::DeviceMeta;
use crate::pointer::{Contact, ContactPhase, PointerTracker, PointerType};
use crate::sample::{SampleQueue, SampleSender};
use crate::state::{AxisTracker, ButtonTracker};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Extended1,
    Extended2,
}

impl MouseButton {
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Middle,
        MouseButton::Right,
        MouseButton::Extended1,
        MouseButton::Extended2,
    ];

    #[inline]
    pub fn index(self) -> u16 {
        self as u16
    }
}

/// Axis indices reported by a mouse.
pub mod axis {
    pub const X: u16 = 0;
    pub const Y: u16 = 1;
}

/// Contact id used for the cursor.
pub const CURSOR_CONTACT: u32 = 0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MouseSample {
    /// Cursor position in normalized surface coordinates.
    Moved { position: Vec2 },
    /// Raw (unaccelerated) movement counts.
    Delta { dx: f32, dy: f32 },
    Button { button: MouseButton, down: bool },
    /// Wheel notches; positive is away from the user.
    Wheel { delta: f32 },
    /// Cursor left the surface.
    Left,
}

pub struct MouseDevice {
    id: DeviceId,
    name: String,
    queue: SampleQueue<MouseSample>,
    buttons: [ButtonTracker; 5],
    x: AxisTracker,
    y: AxisTracker,
    cursor: PointerTracker,
}

impl MouseDevice {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            queue: SampleQueue::new(),
            buttons: [ButtonTracker::default(); 5],
            x: AxisTracker::relative(),
            y: AxisTracker::relative(),
            cursor: PointerTracker::new(PointerType::Mouse),
        }
    }

    pub fn sender(&self) -> SampleSender<MouseSample> {
        self.queue.sender()
    }

    pub fn position(&self) -> Option<Vec2> {
        self.cursor.contacts().first().map(|c| c.position)
    }
}

impl Device for MouseDevice {
    fn poll(&mut self, ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault> {
        let mut out = Vec::new();
        let mut wheel = 0.0;
        self.x.begin_tick();
        self.y.begin_tick();

        for sample in self.queue.drain() {
            match sample {
                MouseSample::Moved { position } => {
                    let phase = if self.cursor.is_live(CURSOR_CONTACT) {
                        ContactPhase::Moved
                    } else {
                        ContactPhase::Began
                    };
                    let contact = Contact::new(CURSOR_CONTACT, position, phase, ctx.now);
                    out.extend(self.cursor.sample(contact).map(InputKind::Pointer));
                }
                MouseSample::Delta { dx, dy } => {
                    self.x.sample(dx, ctx.axis_epsilon);
                    self.y.sample(dy, ctx.axis_epsilon);
                }
                MouseSample::Button { button, down } => {
                    if let Some(edge) = self.buttons[button.index() as usize].sample(down) {
                        out.push(InputKind::MouseButton { button, edge });
                    }
                }
                MouseSample::Wheel { delta } => wheel += delta,
                MouseSample::Left => {
                    if let Some(last) = self.position() {
                        let contact =
                            Contact::new(CURSOR_CONTACT, last, ContactPhase::Ended, ctx.now);
                        out.extend(self.cursor.sample(contact).map(InputKind::Pointer));
                    }
                }
            }
        }

        for (idx, tracker) in [(axis::X, &mut self.x), (axis::Y, &mut self.y)] {
            if let Some(value) = tracker.flush(ctx.axis_epsilon) {
                out.push(InputKind::AxisMoved {
                    axis: idx,
                    value,
                    kind: tracker.kind(),
                });
            }
        }
        if wheel != 0.0 {
            out.push(InputKind::MouseWheel { delta: wheel });
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
        &[Capability::Pointer, Capability::Mouse]
    }

    fn describe(&self) -> Vec<ChannelDesc> {
        let mut channels = vec![
            ChannelDesc::axis(axis::X, "X", i32::MIN, i32::MAX),
            ChannelDesc::axis(axis::Y, "Y", i32::MIN, i32::MAX),
        ];
        channels.extend(
            MouseButton::ALL
                .iter()
                .map(|b| ChannelDesc::button(b.index(), format!("{b:?}"))),
        );
        channels
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::named(self.name.clone())
    }
}
