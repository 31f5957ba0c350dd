//! Device registry and frame pump.
//!
//! [`InputManager`] owns every device, polls each exactly once per [`update`](InputManager::update)
//! and turns what they report into one ordered event list, an up-to-date [`Snapshot`] and
//! gesture events.
//!
//! One tick:
//! 1. clear per-tick state (edges, relative axes, wheel, text);
//! 2. apply pending gesture set changes;
//! 3. apply device adds/removes from [`add_device`](InputManager::add_device),
//!    [`remove_device`](InputManager::remove_device) and every registered source;
//! 4. poll devices in registration order, isolating faults;
//! 5. feed touch contacts to the gesture recognizer and advance its timers;
//! 6. publish: membership notices first, then everything else by time.

use crate::backends::{DeviceSource, SourceChange};
use crate::binding::{BindingOutput, VirtualButton};
use crate::config::InputSettings;
use crate::device::{Capability, Device, DeviceId, DeviceIdentity, DeviceRef, PollCtx};
use crate::devices::keyboard::Key;
use crate::devices::mouse::MouseButton;
use crate::devices::sensor::{SensorKind, SensorReading};
use crate::error::{DeviceFault, InputError};
use crate::event::{DeviceChange, InputEvent, InputKind};
use crate::eventbus::InputEventBus;
use crate::gesture::{GestureId, GestureRecognizer, GestureSet, RecognizerPhase};
use crate::math::Vec2;
use crate::snapshot::Snapshot;
use crate::state::DeviceState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const MANUAL_SOURCE: &str = "manual";

/// A device poll that failed during the last tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FaultReport {
    pub device: DeviceId,
    pub fault: DeviceFault,
    /// Faults in a row, including this one.
    pub consecutive: u32,
    /// The device was dropped because of this fault.
    pub removed: bool,
}

struct DeviceEntry {
    identity: Arc<DeviceIdentity>,
    device: Box<dyn Device>,
    consecutive_faults: u32,
}

pub struct InputManager {
    settings: InputSettings,
    sources: Vec<Box<dyn DeviceSource>>,
    devices: Vec<DeviceEntry>,
    pending: Vec<(String, SourceChange)>,
    /// Identities removed this tick, kept alive so their removal notices still resolve.
    retired: Vec<Arc<DeviceIdentity>>,
    /// Membership notices of a tick that failed, published first by the next one.
    held_notices: Vec<(DeviceRef, Duration, InputKind)>,
    held_retired: Vec<Arc<DeviceIdentity>>,
    snapshot: Snapshot,
    gestures: GestureSet,
    recognizer: GestureRecognizer,
    events: Vec<InputEvent>,
    faults: Vec<FaultReport>,
    bus: InputEventBus,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self::with_settings(InputSettings::default())
    }

    /// Build a manager; `settings.gestures` are registered immediately.
    pub fn with_settings(settings: InputSettings) -> Self {
        let mut gestures = GestureSet::new();
        for config in &settings.gestures {
            gestures.add(config.clone());
        }
        Self {
            settings,
            sources: Vec::new(),
            devices: Vec::new(),
            pending: Vec::new(),
            retired: Vec::new(),
            held_notices: Vec::new(),
            held_retired: Vec::new(),
            snapshot: Snapshot::default(),
            gestures,
            recognizer: GestureRecognizer::new(),
            events: Vec::new(),
            faults: Vec::new(),
            bus: InputEventBus::new(),
        }
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Register a device source. Sources are scanned every tick in registration order.
    pub fn add_source(&mut self, source: impl DeviceSource + 'static) {
        info!(source = source.name(), "device source registered");
        self.sources.push(Box::new(source));
    }

    /// Whether `id` will be registered once the queued changes are applied.
    fn will_be_registered(&self, id: &DeviceId) -> bool {
        self.pending
            .iter()
            .fold(self.index_of(id).is_some(), |present, (_, change)| match change {
                SourceChange::Added(d) if d.id() == id => true,
                SourceChange::Removed(r) if r == id => false,
                _ => present,
            })
    }

    /// Queue a device for registration at the start of the next tick.
    ///
    /// Fails immediately if the id is taken by a registered or queued device that
    /// is not queued for removal.
    pub fn add_device(&mut self, device: impl Device + 'static) -> Result<DeviceId, InputError> {
        let id = device.id().clone();
        if self.will_be_registered(&id) {
            error!(device = %id, "duplicate device id");
            return Err(InputError::DuplicateDevice(id));
        }
        self.pending
            .push((MANUAL_SOURCE.to_string(), SourceChange::Added(Box::new(device))));
        Ok(id)
    }

    /// Queue a device for removal at the start of the next tick.
    pub fn remove_device(&mut self, id: &DeviceId) -> Result<(), InputError> {
        if !self.will_be_registered(id) {
            return Err(InputError::UnknownDevice(id.clone()));
        }
        self.pending
            .push((MANUAL_SOURCE.to_string(), SourceChange::Removed(id.clone())));
        Ok(())
    }

    /// Run one tick at time `now` and return its events.
    ///
    /// `now` comes from a monotonic clock; only differences between ticks matter.
    /// A duplicate device id aborts the tick with [`InputError::DuplicateDevice`]; the
    /// offending device is not registered. Changes applied before it are announced at
    /// the start of the next tick and changes after it stay queued for that tick.
    pub fn update(&mut self, now: Duration) -> Result<&[InputEvent], InputError> {
        self.events.clear();
        self.faults.clear();
        self.retired = std::mem::take(&mut self.held_retired);
        for state in self.snapshot.states_mut() {
            state.begin_tick();
        }
        self.recognizer.sync(&mut self.gestures);

        let mut notices = std::mem::take(&mut self.held_notices);
        if let Err(err) = self.apply_membership(now, &mut notices) {
            self.held_notices = notices;
            self.held_retired = std::mem::take(&mut self.retired);
            return Err(err);
        }

        let body = self.poll_devices(now, &mut notices);

        let mut seq = 0u64;
        for (device, time, kind) in notices.into_iter().chain(body) {
            self.events.push(InputEvent::new(device, seq, time, kind));
            seq += 1;
        }
        self.bus.emit_all(&self.events);
        Ok(&self.events)
    }

    /// Apply queued changes, then every source's scan, in order.
    fn apply_membership(
        &mut self,
        now: Duration,
        notices: &mut Vec<(DeviceRef, Duration, InputKind)>,
    ) -> Result<(), InputError> {
        let mut queue = std::mem::take(&mut self.pending);
        for source in &mut self.sources {
            let name = source.name().to_string();
            queue.extend(source.scan(now).into_iter().map(|c| (name.clone(), c)));
        }
        let mut changes = queue.into_iter();
        while let Some((source, change)) = changes.next() {
            if let Err(err) = self.apply_change(&source, change, now, notices) {
                self.pending.extend(changes);
                return Err(err);
            }
        }
        Ok(())
    }

    fn apply_change(
        &mut self,
        source: &str,
        change: SourceChange,
        now: Duration,
        notices: &mut Vec<(DeviceRef, Duration, InputKind)>,
    ) -> Result<(), InputError> {
        match change {
            SourceChange::Added(device) => {
                let id = device.id().clone();
                if self.index_of(&id).is_some() {
                    error!(device = %id, source, "duplicate device id");
                    return Err(InputError::DuplicateDevice(id));
                }
                let identity = Arc::new(DeviceIdentity {
                    id: id.clone(),
                    name: device.name().to_string(),
                    source: source.to_string(),
                    capabilities: device.capabilities().to_vec(),
                    channels: device.describe(),
                    meta: device.metadata(),
                });
                info!(device = %identity, "device added");
                self.snapshot
                    .insert(id, DeviceState::new(identity.capabilities.clone()));
                notices.push((
                    DeviceRef::new(&identity),
                    now,
                    InputKind::DeviceChanged {
                        change: DeviceChange::Added,
                    },
                ));
                self.devices.push(DeviceEntry {
                    identity,
                    device,
                    consecutive_faults: 0,
                });
            }
            SourceChange::Removed(id) => match self.index_of(&id) {
                Some(idx) => self.retire(idx, now, notices),
                None => warn!(device = %id, source, "removal of unknown device ignored"),
            },
        }
        Ok(())
    }

    fn retire(
        &mut self,
        idx: usize,
        now: Duration,
        notices: &mut Vec<(DeviceRef, Duration, InputKind)>,
    ) {
        let entry = self.devices.remove(idx);
        let id = &entry.identity.id;
        self.snapshot.remove(id);
        self.recognizer.forget_device(id);
        info!(device = %entry.identity, "device removed");
        notices.push((
            DeviceRef::new(&entry.identity),
            now,
            InputKind::DeviceChanged {
                change: DeviceChange::Removed,
            },
        ));
        self.retired.push(entry.identity);
    }

    /// Poll every device once; returns the time-ordered non-membership events.
    fn poll_devices(
        &mut self,
        now: Duration,
        notices: &mut Vec<(DeviceRef, Duration, InputKind)>,
    ) -> Vec<(DeviceRef, Duration, InputKind)> {
        let ctx = PollCtx {
            now,
            axis_epsilon: self.settings.axis_epsilon,
        };
        let mut body = Vec::new();
        let mut gestures = Vec::new();
        let mut failed = Vec::new();

        for entry in &mut self.devices {
            let id = &entry.identity.id;
            let kinds = match entry.device.poll(&ctx) {
                Ok(kinds) => {
                    entry.consecutive_faults = 0;
                    kinds
                }
                Err(fault) => {
                    entry.consecutive_faults += 1;
                    let removed = entry.consecutive_faults >= self.settings.max_consecutive_faults;
                    warn!(
                        device = %id,
                        %fault,
                        consecutive = entry.consecutive_faults,
                        removed,
                        "device poll failed"
                    );
                    self.faults.push(FaultReport {
                        device: id.clone(),
                        fault,
                        consecutive: entry.consecutive_faults,
                        removed,
                    });
                    if removed {
                        failed.push(id.clone());
                    }
                    continue;
                }
            };

            let device = DeviceRef::new(&entry.identity);
            let mut state = self.snapshot.get_mut(id);
            let mut floor = Duration::ZERO;
            for kind in kinds {
                if let Some(state) = state.as_deref_mut() {
                    state.apply(&kind);
                }
                // Pointer samples carry their own timestamp; keep them monotonic per device.
                let time = match &kind {
                    InputKind::Pointer(p) => p.time.min(now).max(floor),
                    _ => now,
                };
                floor = time;
                let before = gestures.len();
                if let InputKind::Pointer(p) = &kind {
                    self.recognizer.process(id, p, &mut gestures);
                }
                body.push((device.clone(), time, kind));
                for g in gestures.drain(before..) {
                    body.push((device.clone(), time, InputKind::Gesture(g)));
                }
            }
        }

        for id in failed {
            if let Some(idx) = self.index_of(&id) {
                warn!(device = %id, "too many consecutive faults, dropping device");
                self.retire(idx, now, notices);
            }
        }

        self.recognizer.advance(now, &mut gestures);
        for g in gestures {
            match self.device_ref(&g.device) {
                Some(device) => body.push((device, g.time, InputKind::Gesture(g))),
                None => debug!(device = %g.device, "gesture from a removed device dropped"),
            }
        }

        body.sort_by_key(|(_, time, _)| *time);
        body
    }

    fn index_of(&self, id: &DeviceId) -> Option<usize> {
        self.devices.iter().position(|e| &e.identity.id == id)
    }

    fn device_ref(&self, id: &DeviceId) -> Option<DeviceRef> {
        self.devices
            .iter()
            .map(|e| &e.identity)
            .chain(self.retired.iter())
            .find(|identity| &identity.id == id)
            .map(DeviceRef::new)
    }

    /// Events produced by the last tick.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Device faults of the last tick.
    pub fn faults(&self) -> &[FaultReport] {
        &self.faults
    }

    /// Registered devices, in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &Arc<DeviceIdentity>> {
        self.devices.iter().map(|e| &e.identity)
    }

    pub fn device(&self, id: &DeviceId) -> Option<Arc<DeviceIdentity>> {
        self.devices
            .iter()
            .find(|e| &e.identity.id == id)
            .map(|e| Arc::clone(&e.identity))
    }

    pub fn device_state(&self, id: &DeviceId) -> Option<&DeviceState> {
        self.snapshot.get(id)
    }

    /// State of every device as of the end of the last tick.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_button_down(&self, id: &DeviceId, button: u16) -> bool {
        self.snapshot
            .get(id)
            .map(|s| s.get_button(button))
            .unwrap_or(false)
    }

    pub fn axis(&self, id: &DeviceId, axis: u16) -> f32 {
        self.snapshot.get(id).map(|s| s.get_axis(axis)).unwrap_or(0.0)
    }

    fn with_capability(&self, capability: Capability) -> impl Iterator<Item = &DeviceState> {
        self.snapshot
            .iter()
            .map(|(_, s)| s)
            .filter(move |s| s.has(capability))
    }

    /// Held on any keyboard.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.with_capability(Capability::Keyboard)
            .any(|s| s.get_button(key.code()))
    }

    /// Went down this tick on any keyboard.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.with_capability(Capability::Keyboard)
            .any(|s| s.is_pressed(key.code()))
    }

    /// Went up this tick on any keyboard.
    pub fn is_key_released(&self, key: Key) -> bool {
        self.with_capability(Capability::Keyboard)
            .any(|s| s.is_released(key.code()))
    }

    /// Every key held on any keyboard, sorted.
    pub fn down_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .with_capability(Capability::Keyboard)
            .flat_map(|s| s.down_buttons())
            .filter_map(Key::from_code)
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Text typed on every keyboard this tick.
    pub fn text_input(&self) -> String {
        self.with_capability(Capability::Keyboard)
            .map(|s| s.text())
            .collect()
    }

    fn mice(&self) -> impl Iterator<Item = &DeviceState> {
        self.with_capability(Capability::Mouse)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mice().any(|s| s.get_button(button.index()))
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mice().any(|s| s.is_pressed(button.index()))
    }

    pub fn is_mouse_button_released(&self, button: MouseButton) -> bool {
        self.mice().any(|s| s.is_released(button.index()))
    }

    /// Cursor position of the first mouse that reported one.
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mice()
            .filter_map(|s| s.pointer())
            .find_map(|p| p.position)
    }

    /// Wheel notches this tick, summed over every mouse.
    pub fn mouse_wheel_delta(&self) -> f32 {
        self.mice().map(|s| s.wheel_delta()).sum()
    }

    /// Latest reading of the first enabled sensor of `kind`.
    pub fn sensor_reading(&self, kind: SensorKind) -> Option<SensorReading> {
        self.with_capability(Capability::Sensor)
            .filter_map(|s| s.sensor())
            .find(|r| r.kind() == kind)
            .copied()
    }

    pub fn gestures(&self) -> &GestureSet {
        &self.gestures
    }

    /// Changes take effect at the start of the next tick.
    pub fn gestures_mut(&mut self) -> &mut GestureSet {
        &mut self.gestures
    }

    pub fn gesture_phase(&self, id: GestureId) -> Option<RecognizerPhase> {
        self.recognizer.phase(id)
    }

    pub fn evaluate(&self, button: &VirtualButton) -> f32 {
        button.evaluate(&self.snapshot)
    }

    /// Resolve the configured binding profile against the current snapshot.
    pub fn resolve_bindings(&self) -> BindingOutput {
        self.settings.bindings.resolve(&self.snapshot)
    }

    /// Listeners receive every tick's events at the end of [`update`](Self::update).
    pub fn event_bus(&mut self) -> &mut InputEventBus {
        &mut self.bus
    }

    /// Consecutive fault count per device, for diagnostics.
    pub fn fault_counts(&self) -> HashMap<DeviceId, u32> {
        self.devices
            .iter()
            .filter(|e| e.consecutive_faults > 0)
            .map(|e| (e.identity.id.clone(), e.consecutive_faults))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::keyboard::{KeyboardDevice, KeyboardSample};
    use crate::devices::mouse::{MouseDevice, MouseSample};
    use crate::devices::touch::TouchDevice;
    use crate::pointer::{Contact, ContactPhase};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn added_devices_announce_then_report() {
        let mut mgr = InputManager::new();
        let kbd = KeyboardDevice::new("kbd", "Keyboard");
        let tx = kbd.sender();
        mgr.add_device(kbd).unwrap();
        tx.send(KeyboardSample::Down(Key::Space));

        let events = mgr.update(ms(16)).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].kind(),
            InputKind::DeviceChanged {
                change: DeviceChange::Added
            }
        ));
        assert_eq!(events[1].seq(), 1);
        assert!(mgr.is_key_down(Key::Space));
        assert!(mgr.is_key_pressed(Key::Space));
        assert_eq!(mgr.down_keys(), vec![Key::Space]);

        mgr.update(ms(32)).unwrap();
        assert!(mgr.is_key_down(Key::Space));
        assert!(!mgr.is_key_pressed(Key::Space));
    }

    #[test]
    fn duplicate_ids_are_rejected_at_add() {
        let mut mgr = InputManager::new();
        mgr.add_device(KeyboardDevice::new("kbd", "A")).unwrap();
        let err = mgr.add_device(KeyboardDevice::new("kbd", "B")).unwrap_err();
        assert!(matches!(err, InputError::DuplicateDevice(id) if id.as_str() == "kbd"));
    }

    #[test]
    fn removing_unknown_device_fails() {
        let mut mgr = InputManager::new();
        assert!(matches!(
            mgr.remove_device(&"ghost".into()),
            Err(InputError::UnknownDevice(_))
        ));
    }

    #[test]
    fn mouse_queries_follow_state() {
        let mut mgr = InputManager::new();
        let mouse = MouseDevice::new("mouse", "Mouse");
        let tx = mouse.sender();
        mgr.add_device(mouse).unwrap();
        mgr.update(ms(0)).unwrap();

        tx.send(MouseSample::Moved {
            position: Vec2::new(0.25, 0.75),
        });
        tx.send(MouseSample::Button {
            button: MouseButton::Left,
            down: true,
        });
        tx.send(MouseSample::Wheel { delta: 1.0 });
        tx.send(MouseSample::Wheel { delta: 2.0 });
        mgr.update(ms(16)).unwrap();

        assert_eq!(mgr.mouse_position(), Some(Vec2::new(0.25, 0.75)));
        assert!(mgr.is_mouse_button_pressed(MouseButton::Left));
        assert!(mgr.is_mouse_button_down(MouseButton::Left));
        assert_eq!(mgr.mouse_wheel_delta(), 3.0);

        mgr.update(ms(32)).unwrap();
        assert_eq!(mgr.mouse_wheel_delta(), 0.0);
        assert!(mgr.is_mouse_button_down(MouseButton::Left));
        assert!(!mgr.is_mouse_button_pressed(MouseButton::Left));

        tx.send(MouseSample::Left);
        mgr.update(ms(48)).unwrap();
        assert_eq!(mgr.mouse_position(), None);

        tx.send(MouseSample::Moved {
            position: Vec2::new(0.5, 0.5),
        });
        mgr.update(ms(64)).unwrap();
        assert_eq!(mgr.mouse_position(), Some(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn touch_surfaces_are_not_mice() {
        let mut mgr = InputManager::new();
        let screen = TouchDevice::new("screen", "Screen");
        let touches = screen.sender();
        mgr.add_device(screen).unwrap();
        mgr.update(ms(0)).unwrap();

        touches.send(Contact::new(1, Vec2::new(0.1, 0.1), ContactPhase::Began, ms(16)));
        mgr.update(ms(16)).unwrap();
        assert_eq!(mgr.mouse_position(), None);
        assert!(!mgr.is_mouse_button_down(MouseButton::Left));
    }

    #[test]
    fn unplug_then_replug_with_the_same_id() {
        let mut mgr = InputManager::new();
        mgr.add_device(KeyboardDevice::new("kbd", "Old")).unwrap();
        mgr.update(ms(0)).unwrap();

        mgr.remove_device(&"kbd".into()).unwrap();
        mgr.add_device(KeyboardDevice::new("kbd", "New")).unwrap();
        assert!(matches!(
            mgr.add_device(KeyboardDevice::new("kbd", "Third")),
            Err(InputError::DuplicateDevice(_))
        ));

        let changes: Vec<_> = mgr
            .update(ms(16))
            .unwrap()
            .iter()
            .filter_map(|e| match e.kind() {
                InputKind::DeviceChanged { change } => Some(*change),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![DeviceChange::Removed, DeviceChange::Added]);
        let names: Vec<_> = mgr.devices().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["New"]);
    }
}
