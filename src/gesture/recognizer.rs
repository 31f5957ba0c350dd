//! Gesture state machines.
//!
//! Every registered [`GestureConfig`] gets its own [`Machine`]. Machines see the same
//! contact stream and never coordinate: two configs that both match report both
//! gestures, and the consumer arbitrates.
//!
//! Lifecycle of one machine:
//!
//! ```text
//! Idle --first contact--> Tracking --match--> Recognized --all contacts lifted--> Idle
//!                            |
//!                            +--violation--> Cancelled --all contacts lifted--> Idle
//! ```
//!
//! After recognition or cancellation the machine stops interpreting the contacts that are
//! still down (and any new ones) until the surface is clear, so a leftover finger can never
//! start a bogus gesture. Cancellation never produces an event, with one exception: a drag
//! or composite that already began reports `Ended` when the finger count changes.

use super::{
    CompositeConfig, DragConfig, FlickConfig, GestureConfig, GestureDetail, GestureEvent,
    GestureId, GesturePhase, GestureSet, GestureSetChange, LongPressConfig, TapConfig,
};
use crate::device::DeviceId;
use crate::math::{wrap_angle, Vec2};
use crate::pointer::{ContactPhase, PointerEvent, PointerType};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecognizerPhase {
    Idle,
    Tracking,
    Recognized,
    Cancelled,
}

type ContactKey = (DeviceId, u32);

#[derive(Clone, Debug)]
struct Tracked {
    key: ContactKey,
    start: Vec2,
    position: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct TapRecord {
    time: Duration,
    position: Vec2,
    count: u32,
}

#[derive(Clone, Copy, Debug)]
struct DragProgress {
    start: Vec2,
    last: Vec2,
}

/// Two-finger measurement used by the composite gesture.
#[derive(Clone, Copy, Debug)]
struct Pinch {
    center: Vec2,
    distance: f32,
    angle: f32,
}

impl Pinch {
    fn measure(a: Vec2, b: Vec2) -> Self {
        Self {
            center: (a + b) / 2.0,
            distance: a.distance(b),
            angle: (b - a).angle(),
        }
    }

    fn scale_from(&self, other: &Pinch) -> f32 {
        if other.distance > f32::EPSILON {
            self.distance / other.distance
        } else {
            1.0
        }
    }
}

#[derive(Debug)]
enum Kind {
    Tap {
        config: TapConfig,
        fingers_seen: u32,
        anchor: Vec2,
        last: Option<TapRecord>,
    },
    Flick {
        config: FlickConfig,
    },
    Drag {
        config: DragConfig,
        active: Option<DragProgress>,
    },
    LongPress {
        config: LongPressConfig,
        armed_at: Option<Duration>,
    },
    Composite {
        config: CompositeConfig,
        origin: Option<Pinch>,
        last: Option<Pinch>,
        active: bool,
    },
}

impl Kind {
    fn new(config: GestureConfig) -> Self {
        match config {
            GestureConfig::Tap(config) => Kind::Tap {
                config,
                fingers_seen: 0,
                anchor: Vec2::ZERO,
                last: None,
            },
            GestureConfig::Flick(config) => Kind::Flick { config },
            GestureConfig::Drag(config) => Kind::Drag {
                config,
                active: None,
            },
            GestureConfig::LongPress(config) => Kind::LongPress {
                config,
                armed_at: None,
            },
            GestureConfig::Composite(config) => Kind::Composite {
                config,
                origin: None,
                last: None,
                active: false,
            },
        }
    }

    fn fingers(&self) -> usize {
        let n = match self {
            Kind::Tap { config, .. } => config.fingers,
            Kind::Flick { config } => config.fingers,
            Kind::Drag { config, .. } => config.fingers,
            Kind::LongPress { config, .. } => config.fingers,
            Kind::Composite { .. } => 2,
        };
        n.max(1) as usize
    }

    fn gesture_type(&self) -> super::GestureType {
        match self {
            Kind::Tap { .. } => super::GestureType::Tap,
            Kind::Flick { .. } => super::GestureType::Flick,
            Kind::Drag { .. } => super::GestureType::Drag,
            Kind::LongPress { .. } => super::GestureType::LongPress,
            Kind::Composite { .. } => super::GestureType::Composite,
        }
    }

    /// Forget per-attempt progress. The tap sequence survives unless `drop_sequence`.
    fn reset(&mut self, drop_sequence: bool) {
        match self {
            Kind::Tap {
                fingers_seen, last, ..
            } => {
                *fingers_seen = 0;
                if drop_sequence {
                    *last = None;
                }
            }
            Kind::Flick { .. } => {}
            Kind::Drag { active, .. } => *active = None,
            Kind::LongPress { armed_at, .. } => *armed_at = None,
            Kind::Composite {
                origin,
                last,
                active,
                ..
            } => {
                *origin = None;
                *last = None;
                *active = false;
            }
        }
    }
}

#[derive(Debug)]
struct Machine {
    id: GestureId,
    phase: RecognizerPhase,
    kind: Kind,
    contacts: Vec<Tracked>,
    /// Contacts still down after recognition/cancellation.
    ignored: Vec<ContactKey>,
    started: Duration,
    device: DeviceId,
}

impl Machine {
    fn new(id: GestureId, config: GestureConfig) -> Self {
        Self {
            id,
            phase: RecognizerPhase::Idle,
            kind: Kind::new(config),
            contacts: Vec::new(),
            ignored: Vec::new(),
            started: Duration::ZERO,
            device: DeviceId::default(),
        }
    }

    fn draining(&self) -> bool {
        matches!(
            self.phase,
            RecognizerPhase::Recognized | RecognizerPhase::Cancelled
        ) && self.contacts.is_empty()
    }

    fn emit(&self, out: &mut Vec<GestureEvent>, phase: GesturePhase, time: Duration, detail: GestureDetail) {
        tracing::debug!(gesture = %self.id, ?phase, "gesture event");
        out.push(GestureEvent {
            gesture: self.id,
            device: self.device.clone(),
            gesture_type: self.kind.gesture_type(),
            phase,
            fingers: self.kind.fingers() as u32,
            time,
            elapsed: time.saturating_sub(self.started),
            detail,
        });
    }

    fn centroid(&self) -> Vec2 {
        Vec2::centroid(self.contacts.iter().map(|c| c.position))
    }

    fn start_centroid(&self) -> Vec2 {
        Vec2::centroid(self.contacts.iter().map(|c| c.start))
    }

    fn index_of(&self, key: &ContactKey) -> Option<usize> {
        self.contacts.iter().position(|c| &c.key == key)
    }

    /// Stop interpreting the current contacts until they lift.
    fn settle(&mut self, phase: RecognizerPhase) {
        self.phase = phase;
        self.ignored.extend(self.contacts.drain(..).map(|c| c.key));
        if self.ignored.is_empty() {
            self.phase = RecognizerPhase::Idle;
        }
    }

    fn cancel(&mut self) {
        if self.phase != RecognizerPhase::Cancelled {
            tracing::debug!(gesture = %self.id, "gesture cancelled");
        }
        self.kind.reset(true);
        self.settle(RecognizerPhase::Cancelled);
    }

    fn recognized(&mut self) {
        self.kind.reset(false);
        self.settle(RecognizerPhase::Recognized);
    }

    fn drain(&mut self, key: ContactKey, phase: ContactPhase) {
        match phase {
            ContactPhase::Began => self.ignored.push(key),
            ContactPhase::Moved => {}
            ContactPhase::Ended | ContactPhase::Cancelled => self.ignored.retain(|k| k != &key),
        }
        if self.ignored.is_empty() {
            self.phase = RecognizerPhase::Idle;
        }
    }

    fn on_pointer(&mut self, key: ContactKey, ev: &PointerEvent, out: &mut Vec<GestureEvent>) {
        if self.draining() {
            self.drain(key, ev.phase);
            return;
        }
        match ev.phase {
            ContactPhase::Began => self.on_began(key, ev, out),
            ContactPhase::Moved => {
                if let Some(i) = self.index_of(&key) {
                    self.contacts[i].position = ev.position;
                    self.on_moved(ev.time, out);
                }
            }
            ContactPhase::Ended => {
                if let Some(i) = self.index_of(&key) {
                    self.contacts[i].position = ev.position;
                    self.on_ended(i, ev.time, out);
                }
            }
            ContactPhase::Cancelled => {
                if let Some(i) = self.index_of(&key) {
                    self.contacts.remove(i);
                    self.cancel();
                }
            }
        }
    }

    fn on_began(&mut self, key: ContactKey, ev: &PointerEvent, out: &mut Vec<GestureEvent>) {
        let tracked = Tracked {
            key,
            start: ev.position,
            position: ev.position,
        };

        if self.contacts.len() >= self.kind.fingers() {
            self.end_continuous(ev.time, out);
            self.contacts.push(tracked);
            self.cancel();
            return;
        }

        if self.contacts.is_empty() {
            self.started = ev.time;
            self.device = tracked.key.0.clone();
            self.phase = RecognizerPhase::Tracking;
        }
        self.contacts.push(tracked);
        let count = self.contacts.len();
        let full = count == self.kind.fingers();
        let anchor = self.start_centroid();
        let pinch = (count == 2).then(|| Pinch::measure(self.contacts[0].position, self.contacts[1].position));

        match &mut self.kind {
            Kind::Tap {
                fingers_seen,
                anchor: tap_anchor,
                ..
            } => {
                *fingers_seen = (*fingers_seen).max(count as u32);
                if full {
                    *tap_anchor = anchor;
                }
            }
            Kind::LongPress { armed_at, .. } => {
                if full {
                    *armed_at = Some(ev.time);
                }
            }
            Kind::Composite { origin, last, .. } => {
                if let Some(p) = pinch {
                    *origin = Some(p);
                    *last = Some(p);
                }
            }
            Kind::Flick { .. } | Kind::Drag { .. } => {}
        }
    }

    fn on_moved(&mut self, time: Duration, out: &mut Vec<GestureEvent>) {
        let full = self.contacts.len() == self.kind.fingers();
        let max_offset = self
            .contacts
            .iter()
            .map(|c| c.position.distance(c.start))
            .fold(0.0f32, f32::max);
        let elapsed = time.saturating_sub(self.started);

        match &self.kind {
            Kind::Tap { config, .. } => {
                if max_offset > config.max_press_distance {
                    self.cancel();
                }
            }
            Kind::Flick { config } => {
                if elapsed > config.max_duration {
                    self.cancel();
                }
            }
            Kind::LongPress { config, .. } => {
                if max_offset > config.max_translation {
                    self.cancel();
                }
            }
            Kind::Drag { .. } if full => self.drag_moved(time, out),
            Kind::Composite { .. } if full => self.composite_moved(time, out),
            Kind::Drag { .. } | Kind::Composite { .. } => {}
        }
    }

    fn drag_moved(&mut self, time: Duration, out: &mut Vec<GestureEvent>) {
        let now = self.centroid();
        let start = self.start_centroid();
        let Kind::Drag { config, active } = &mut self.kind else {
            return;
        };
        let shape = config.shape;

        match active {
            Some(progress) => {
                let delta = shape.constrain(now - progress.last);
                if delta == Vec2::ZERO {
                    return;
                }
                let position = progress.last + delta;
                progress.last = position;
                let detail = GestureDetail::Drag {
                    start: progress.start,
                    position,
                    delta,
                    total: position - progress.start,
                };
                self.emit(out, GesturePhase::Changed, time, detail);
            }
            None => {
                let translation = now - start;
                if !shape.within_margin(translation, config.allowed_error_margin) {
                    self.cancel();
                    return;
                }
                let travelled = shape.constrain(translation);
                if travelled.length() < config.min_distance {
                    return;
                }
                let position = start + travelled;
                *active = Some(DragProgress {
                    start,
                    last: position,
                });
                self.phase = RecognizerPhase::Recognized;
                let detail = GestureDetail::Drag {
                    start,
                    position,
                    delta: travelled,
                    total: travelled,
                };
                self.emit(out, GesturePhase::Began, time, detail);
            }
        }
    }

    fn composite_moved(&mut self, time: Duration, out: &mut Vec<GestureEvent>) {
        let current = Pinch::measure(self.contacts[0].position, self.contacts[1].position);
        let Kind::Composite {
            config,
            origin: Some(origin),
            last,
            active,
        } = &mut self.kind
        else {
            return;
        };
        let origin = *origin;
        let previous = last.unwrap_or(origin);

        let total_translation = current.center - origin.center;
        let total_rotation = wrap_angle(current.angle - origin.angle);
        let total_scale = current.scale_from(&origin);

        let phase = if *active {
            GesturePhase::Changed
        } else if total_translation.length() >= config.min_translation
            || (total_scale - 1.0).abs() >= config.min_scale_ratio
            || total_rotation.abs() >= config.min_rotation
        {
            *active = true;
            GesturePhase::Began
        } else {
            return;
        };
        *last = Some(current);

        let detail = if phase == GesturePhase::Began {
            GestureDetail::Composite {
                center: current.center,
                delta_translation: total_translation,
                total_translation,
                delta_rotation: total_rotation,
                total_rotation,
                delta_scale: total_scale,
                total_scale,
            }
        } else {
            GestureDetail::Composite {
                center: current.center,
                delta_translation: current.center - previous.center,
                total_translation,
                delta_rotation: wrap_angle(current.angle - previous.angle),
                total_rotation,
                delta_scale: current.scale_from(&previous),
                total_scale,
            }
        };
        self.phase = RecognizerPhase::Recognized;
        self.emit(out, phase, time, detail);
    }

    /// Report `Ended` for an active drag/composite. Returns whether one was active.
    fn end_continuous(&mut self, time: Duration, out: &mut Vec<GestureEvent>) -> bool {
        let detail = match &mut self.kind {
            Kind::Drag {
                active: Some(progress),
                ..
            } => GestureDetail::Drag {
                start: progress.start,
                position: progress.last,
                delta: Vec2::ZERO,
                total: progress.last - progress.start,
            },
            Kind::Composite {
                origin: Some(origin),
                last,
                active: true,
                ..
            } => {
                let last = last.unwrap_or(*origin);
                GestureDetail::Composite {
                    center: last.center,
                    delta_translation: Vec2::ZERO,
                    total_translation: last.center - origin.center,
                    delta_rotation: 0.0,
                    total_rotation: wrap_angle(last.angle - origin.angle),
                    delta_scale: 1.0,
                    total_scale: last.scale_from(origin),
                }
            }
            _ => return false,
        };
        self.emit(out, GesturePhase::Ended, time, detail);
        true
    }

    fn on_ended(&mut self, idx: usize, time: Duration, out: &mut Vec<GestureEvent>) {
        let elapsed = time.saturating_sub(self.started);
        let full = self.contacts.len() == self.kind.fingers();

        match &self.kind {
            Kind::Tap { config, .. } => {
                let c = &self.contacts[idx];
                if elapsed > config.max_press_time
                    || c.position.distance(c.start) > config.max_press_distance
                {
                    self.contacts.remove(idx);
                    self.cancel();
                    return;
                }
                self.contacts.remove(idx);
                if self.contacts.is_empty() {
                    self.tap_released(time, out);
                }
            }
            Kind::Flick { config } => {
                let start = self.start_centroid();
                let end = self.centroid();
                let translation = end - start;
                let length = translation.length();
                let secs = elapsed.as_secs_f32();
                // A stroke with no measurable duration has no speed and never flicks.
                let average_speed = if secs > 0.0 { length / secs } else { 0.0 };
                let matched = full
                    && secs > 0.0
                    && length >= config.min_length
                    && average_speed >= config.min_average_speed
                    && elapsed <= config.max_duration
                    && config
                        .shape
                        .within_margin(translation, config.allowed_error_margin);

                self.contacts.remove(idx);
                if matched {
                    let detail = GestureDetail::Flick {
                        start,
                        end,
                        translation,
                        average_speed,
                    };
                    self.emit(out, GesturePhase::Occurred, time, detail);
                    self.recognized();
                } else {
                    self.cancel();
                }
            }
            Kind::Drag { .. } | Kind::Composite { .. } => {
                let was_active = self.end_continuous(time, out);
                self.contacts.remove(idx);
                if was_active {
                    self.recognized();
                } else {
                    self.cancel();
                }
            }
            Kind::LongPress { .. } => {
                self.contacts.remove(idx);
                self.cancel();
            }
        }
    }

    fn tap_released(&mut self, time: Duration, out: &mut Vec<GestureEvent>) {
        let Kind::Tap {
            config,
            fingers_seen,
            anchor,
            last,
        } = &mut self.kind
        else {
            return;
        };

        if *fingers_seen != config.fingers.max(1) {
            *fingers_seen = 0;
            *last = None;
            self.phase = RecognizerPhase::Idle;
            return;
        }
        *fingers_seen = 0;

        let position = *anchor;
        let count = match *last {
            Some(prev)
                if time.saturating_sub(prev.time) <= config.max_time_between_taps
                    && prev.position.distance(position) <= config.max_distance_between_taps =>
            {
                prev.count + 1
            }
            _ => 1,
        };

        if count >= config.required_taps.max(1) {
            *last = None;
            let detail = GestureDetail::Tap {
                position,
                taps: count,
            };
            self.emit(out, GesturePhase::Occurred, time, detail);
        } else {
            *last = Some(TapRecord {
                time,
                position,
                count,
            });
        }
        self.phase = RecognizerPhase::Idle;
    }

    fn advance(&mut self, now: Duration, out: &mut Vec<GestureEvent>) {
        let elapsed = now.saturating_sub(self.started);
        let tracking = self.phase == RecognizerPhase::Tracking;

        match &mut self.kind {
            Kind::Tap { config, last, .. } => {
                if tracking && elapsed > config.max_press_time {
                    self.cancel();
                } else if let Some(prev) = *last {
                    if now.saturating_sub(prev.time) > config.max_time_between_taps {
                        *last = None;
                    }
                }
            }
            Kind::Flick { config } => {
                if tracking && elapsed > config.max_duration {
                    self.cancel();
                }
            }
            Kind::LongPress { config, armed_at } => {
                let Some(armed) = *armed_at else {
                    return;
                };
                if tracking && now.saturating_sub(armed) >= config.required_press_time {
                    let position = self.centroid();
                    self.emit(
                        out,
                        GesturePhase::Occurred,
                        now,
                        GestureDetail::LongPress { position },
                    );
                    self.recognized();
                }
            }
            Kind::Drag { .. } | Kind::Composite { .. } => {}
        }
    }

    fn forget_device(&mut self, device: &DeviceId) {
        let touched = self.contacts.iter().any(|c| &c.key.0 == device);
        self.ignored.retain(|k| &k.0 != device);
        if touched {
            self.contacts.retain(|c| &c.key.0 != device);
            self.cancel();
        } else if self.draining() && self.ignored.is_empty() {
            self.phase = RecognizerPhase::Idle;
        }
    }
}

/// Runs one machine per configured gesture over the touch contact stream.
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    machines: Vec<Machine>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start machines for added configs and retire machines for removed ones.
    pub fn sync(&mut self, set: &mut GestureSet) {
        for change in set.take_changes() {
            match change {
                GestureSetChange::Added(id) => {
                    if let Some(config) = set.get(id) {
                        self.machines.push(Machine::new(id, config.clone()));
                    }
                }
                GestureSetChange::Removed(id) => self.machines.retain(|m| m.id != id),
            }
        }
    }

    /// Feed one pointer event. Only touch and pen contacts drive gestures.
    pub fn process(&mut self, device: &DeviceId, ev: &PointerEvent, out: &mut Vec<GestureEvent>) {
        if ev.pointer_type == PointerType::Mouse {
            return;
        }
        for machine in &mut self.machines {
            machine.on_pointer((device.clone(), ev.contact_id), ev, out);
        }
    }

    /// Evaluate time-based transitions (long press, timeouts).
    pub fn advance(&mut self, now: Duration, out: &mut Vec<GestureEvent>) {
        for machine in &mut self.machines {
            machine.advance(now, out);
        }
    }

    /// Drop every contact that came from `device`, cancelling gestures that used them.
    pub fn forget_device(&mut self, device: &DeviceId) {
        for machine in &mut self.machines {
            machine.forget_device(device);
        }
    }

    pub fn phase(&self, id: GestureId) -> Option<RecognizerPhase> {
        self.machines.iter().find(|m| m.id == id).map(|m| m.phase)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}
