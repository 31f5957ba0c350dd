//! Control state machines and the accumulated per-device state.
//!
//! [`ButtonTracker`] and [`AxisTracker`] live inside devices and decide *when* an event
//! is emitted. [`DeviceState`] lives in the manager's [`Snapshot`](crate::snapshot::Snapshot)
//! and is folded from those events, so consumers can ask "is this down right now"
//! without replaying the event list.

use crate::device::Capability;
use crate::devices::sensor::SensorReading;
use crate::event::{ButtonEdge, InputKind};
use crate::math::Vec2;
use crate::pointer::{Contact, ContactPhase, PointerType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `Up -> Down` emits `Pressed`, `Down -> Up` emits `Released`, anything else is silent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonTracker {
    down: bool,
}

impl ButtonTracker {
    pub fn is_down(&self) -> bool {
        self.down
    }

    pub fn sample(&mut self, down: bool) -> Option<ButtonEdge> {
        match (self.down, down) {
            (false, true) => {
                self.down = true;
                Some(ButtonEdge::Pressed)
            }
            (true, false) => {
                self.down = false;
                Some(ButtonEdge::Released)
            }
            _ => None,
        }
    }
}

/// How an axis interprets its raw samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisKind {
    /// Samples are positions (stick, trigger). The last value persists.
    #[default]
    Absolute,
    /// Samples are movement (mouse counts, wheel notches). They accumulate over one
    /// tick and the value falls back to neutral on the next tick unless re-sampled.
    Relative,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisTracker {
    kind: AxisKind,
    value: f32,
    reported: f32,
}

impl AxisTracker {
    pub fn new(kind: AxisKind) -> Self {
        Self {
            kind,
            value: 0.0,
            reported: 0.0,
        }
    }

    pub fn absolute() -> Self {
        Self::new(AxisKind::Absolute)
    }

    pub fn relative() -> Self {
        Self::new(AxisKind::Relative)
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    /// Latest raw value (absolute) or this tick's accumulated movement (relative).
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Reset relative movement at the start of a tick.
    pub fn begin_tick(&mut self) {
        if self.kind == AxisKind::Relative {
            self.value = 0.0;
        }
    }

    /// Feed one raw sample.
    ///
    /// Absolute axes return the raw value when it moved more than `epsilon` away from
    /// the last reported value. Relative axes only accumulate; see [`Self::flush`].
    pub fn sample(&mut self, raw: f32, epsilon: f32) -> Option<f32> {
        match self.kind {
            AxisKind::Absolute => {
                self.value = raw;
                if (raw - self.reported).abs() > epsilon {
                    self.reported = raw;
                    Some(raw)
                } else {
                    None
                }
            }
            AxisKind::Relative => {
                self.value += raw;
                None
            }
        }
    }

    /// End of tick: relative axes report their accumulated delta if it is non-neutral.
    pub fn flush(&mut self, epsilon: f32) -> Option<f32> {
        match self.kind {
            AxisKind::Absolute => None,
            AxisKind::Relative => {
                self.reported = self.value;
                (self.value.abs() > epsilon).then_some(self.value)
            }
        }
    }
}

/// Pointer portion of a device's state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    /// Kind of pointer that last reported.
    pub pointer_type: Option<PointerType>,
    /// Last reported position of the most recently active contact.
    pub position: Option<Vec2>,
    /// Movement accumulated this tick over all contacts.
    pub delta: Vec2,
    /// Live contacts in begin order.
    pub contacts: Vec<Contact>,
}

/// Accumulated state of one device at the end of the last tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    capabilities: Vec<Capability>,
    buttons: BTreeMap<u16, bool>,
    pressed: BTreeSet<u16>,
    released: BTreeSet<u16>,
    axes: BTreeMap<u16, f32>,
    relative_axes: BTreeSet<u16>,
    hats: BTreeMap<u16, i16>,
    wheel_delta: f32,
    pointer: Option<PointerState>,
    sensor: Option<SensorReading>,
    text: String,
}

impl DeviceState {
    pub fn new(capabilities: Vec<Capability>) -> Self {
        let pointer = capabilities
            .contains(&Capability::Pointer)
            .then(PointerState::default);
        Self {
            capabilities,
            pointer,
            ..Self::default()
        }
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether a button (key code, mouse button index, gamepad button index) is held.
    pub fn get_button(&self, idx: u16) -> bool {
        self.buttons.get(&idx).copied().unwrap_or(false)
    }

    /// Button went down during the last tick.
    pub fn is_pressed(&self, idx: u16) -> bool {
        self.pressed.contains(&idx)
    }

    /// Button went up during the last tick.
    pub fn is_released(&self, idx: u16) -> bool {
        self.released.contains(&idx)
    }

    /// Indices of every held button, ascending.
    pub fn down_buttons(&self) -> impl Iterator<Item = u16> + '_ {
        self.buttons.iter().filter(|(_, &d)| d).map(|(&i, _)| i)
    }

    /// Current axis value (0.0 if never reported).
    pub fn get_axis(&self, idx: u16) -> f32 {
        self.axes.get(&idx).copied().unwrap_or(0.0)
    }

    /// Current hat slot (`-1` if neutral or never reported).
    pub fn get_hat(&self, idx: u16) -> i16 {
        self.hats.get(&idx).copied().unwrap_or(-1)
    }

    pub fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }

    pub fn pointer(&self) -> Option<&PointerState> {
        self.pointer.as_ref()
    }

    pub fn sensor(&self) -> Option<&SensorReading> {
        self.sensor.as_ref()
    }

    /// Text typed during the last tick.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Clear per-tick state. Held buttons and absolute axes persist.
    pub(crate) fn begin_tick(&mut self) {
        self.pressed.clear();
        self.released.clear();
        self.wheel_delta = 0.0;
        self.text.clear();
        for idx in &self.relative_axes {
            self.axes.insert(*idx, 0.0);
        }
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.delta = Vec2::ZERO;
        }
    }

    pub(crate) fn apply(&mut self, kind: &InputKind) {
        match kind {
            InputKind::Key { key, edge } => self.apply_button(key.code(), *edge),
            InputKind::MouseButton { button, edge } => self.apply_button(button.index(), *edge),
            InputKind::GamePadButton { button, edge } => self.apply_button(*button, *edge),
            InputKind::TextInput { text } => self.text.push_str(text),
            InputKind::MouseWheel { delta } => self.wheel_delta += delta,
            InputKind::AxisMoved { axis, value, kind } => {
                if *kind == AxisKind::Relative {
                    self.relative_axes.insert(*axis);
                }
                self.axes.insert(*axis, *value);
            }
            InputKind::HatChanged { hat, value } => {
                self.hats.insert(*hat, *value);
            }
            InputKind::Pointer(ev) => {
                let pointer = self.pointer.get_or_insert_with(PointerState::default);
                pointer.pointer_type = Some(ev.pointer_type);
                pointer.position = Some(ev.position);
                pointer.delta += ev.delta;
                let existing = pointer.contacts.iter().position(|c| c.id == ev.contact_id);
                match (ev.phase, existing) {
                    (phase, Some(i)) if phase.is_final() => {
                        pointer.contacts.remove(i);
                    }
                    (_, Some(i)) => {
                        pointer.contacts[i].position = ev.position;
                        pointer.contacts[i].phase = ev.phase;
                        pointer.contacts[i].time = ev.time;
                    }
                    (ContactPhase::Began, None) | (ContactPhase::Moved, None) => {
                        pointer.contacts.push(Contact::new(
                            ev.contact_id,
                            ev.position,
                            ev.phase,
                            ev.time,
                        ));
                    }
                    _ => {}
                }
                // A cursor that left the surface has no position.
                if ev.pointer_type == PointerType::Mouse
                    && ev.phase.is_final()
                    && pointer.contacts.is_empty()
                {
                    pointer.position = None;
                }
            }
            InputKind::SensorChanged { reading, .. } => self.sensor = *reading,
            InputKind::Gesture(_) | InputKind::DeviceChanged { .. } => {}
        }
    }

    fn apply_button(&mut self, idx: u16, edge: ButtonEdge) {
        match edge {
            ButtonEdge::Pressed => {
                self.buttons.insert(idx, true);
                self.pressed.insert(idx);
            }
            ButtonEdge::Released => {
                self.buttons.insert(idx, false);
                self.released.insert(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn button_edges_fire_once() {
        let mut b = ButtonTracker::default();
        assert_eq!(b.sample(true), Some(ButtonEdge::Pressed));
        assert_eq!(b.sample(true), None);
        assert_eq!(b.sample(true), None);
        assert_eq!(b.sample(false), Some(ButtonEdge::Released));
        assert_eq!(b.sample(false), None);
        assert!(!b.is_down());
    }

    #[test]
    fn absolute_axis_reports_raw_value() {
        let mut a = AxisTracker::absolute();
        assert_eq!(a.sample(0.5, 0.001), Some(0.5));
        assert_eq!(a.sample(0.5004, 0.001), None);
        assert_eq!(a.value(), 0.5004);
        assert_eq!(a.sample(-0.25, 0.001), Some(-0.25));

        a.begin_tick();
        assert_eq!(a.value(), -0.25, "absolute axes persist across ticks");
    }

    #[test]
    fn relative_axis_reports_tick_delta_and_resets() {
        let mut a = AxisTracker::relative();
        a.begin_tick();
        assert_eq!(a.sample(3.0, 0.001), None);
        assert_eq!(a.sample(2.0, 0.001), None);
        assert_eq!(a.flush(0.001), Some(5.0));

        a.begin_tick();
        assert_eq!(a.value(), 0.0);
        assert_eq!(a.flush(0.001), None);
    }

    #[test]
    fn device_state_tracks_edges_per_tick() {
        let mut s = DeviceState::new(vec![Capability::GameController]);
        s.apply(&InputKind::GamePadButton {
            button: 3,
            edge: ButtonEdge::Pressed,
        });
        assert!(s.get_button(3));
        assert!(s.is_pressed(3));

        s.begin_tick();
        assert!(s.get_button(3));
        assert!(!s.is_pressed(3));

        s.apply(&InputKind::GamePadButton {
            button: 3,
            edge: ButtonEdge::Released,
        });
        assert!(!s.get_button(3));
        assert!(s.is_released(3));
    }

    #[test]
    fn relative_axes_return_to_neutral() {
        let mut s = DeviceState::new(vec![Capability::Pointer]);
        s.apply(&InputKind::AxisMoved {
            axis: 0,
            value: 4.0,
            kind: AxisKind::Relative,
        });
        s.apply(&InputKind::AxisMoved {
            axis: 5,
            value: 0.75,
            kind: AxisKind::Absolute,
        });
        s.begin_tick();
        assert_eq!(s.get_axis(0), 0.0);
        assert_eq!(s.get_axis(5), 0.75);
    }

    proptest! {
        #[test]
        fn edges_match_transitions(samples in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut b = ButtonTracker::default();
            let mut prev = false;
            let mut pressed = 0;
            let mut released = 0;
            let mut expected_pressed = 0;
            let mut expected_released = 0;

            for &s in &samples {
                match b.sample(s) {
                    Some(ButtonEdge::Pressed) => pressed += 1,
                    Some(ButtonEdge::Released) => released += 1,
                    None => {}
                }
                if !prev && s { expected_pressed += 1; }
                if prev && !s { expected_released += 1; }
                prev = s;
            }

            prop_assert_eq!(pressed, expected_pressed);
            prop_assert_eq!(released, expected_released);
            prop_assert_eq!(b.is_down(), prev);
        }
    }
}
