use std::time::Duration;
use tickinput::{
    Capability, ContactPhase, Device, DeviceChange, DeviceFault, DeviceId, InputError, InputKind,
    InputManager, InputSettings, Key, KeyboardDevice, KeyboardSample, PollCtx, SensorDevice,
    SensorKind, SensorReading, TouchDevice, Vec2, Vec3, VirtualSource,
};
use tickinput::{Contact, DeviceMeta};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Fails every poll.
struct FaultyDevice {
    id: DeviceId,
}

impl Device for FaultyDevice {
    fn poll(&mut self, _ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault> {
        Err(DeviceFault::Read("bus reset".into()))
    }

    fn name(&self) -> &str {
        "Faulty"
    }

    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::GameController]
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::virtual_device("Faulty")
    }
}

fn change_of(kind: &InputKind) -> Option<DeviceChange> {
    match kind {
        InputKind::DeviceChanged { change } => Some(*change),
        _ => None,
    }
}

#[test]
fn removal_notice_is_the_last_word_of_a_device() {
    let (source, handle) = VirtualSource::new("sim");
    let mut mgr = InputManager::new();
    mgr.add_source(source);

    let kbd = KeyboardDevice::new("sim:kbd", "Keyboard");
    let keys = kbd.sender();
    handle.add_device(kbd);
    let events = mgr.update(ms(0)).unwrap();
    assert_eq!(change_of(events[0].kind()), Some(DeviceChange::Added));
    assert_eq!(events[0].device().upgrade().unwrap().source, "sim");

    // The key press is queued but the device is unplugged before the tick runs.
    keys.send(KeyboardSample::Down(Key::Space));
    handle.remove_device("sim:kbd");
    let events = mgr.update(ms(16)).unwrap().to_vec();

    assert_eq!(events.len(), 1);
    assert_eq!(change_of(events[0].kind()), Some(DeviceChange::Removed));
    assert_eq!(events[0].device().id().as_str(), "sim:kbd");
    assert!(events[0].device().is_connected());
    assert!(!mgr.is_key_down(Key::Space));
    assert!(mgr.device_state(&"sim:kbd".into()).is_none());

    mgr.update(ms(32)).unwrap();
    assert!(!events[0].device().is_connected());
    assert_eq!(mgr.devices().count(), 0);
}

#[test]
fn faulting_device_is_isolated_then_dropped() {
    let mut mgr = InputManager::with_settings(InputSettings {
        max_consecutive_faults: 2,
        ..InputSettings::default()
    });
    let kbd = KeyboardDevice::new("kbd", "Keyboard");
    let keys = kbd.sender();
    mgr.add_device(FaultyDevice { id: "bad".into() }).unwrap();
    mgr.add_device(kbd).unwrap();

    keys.send(KeyboardSample::Down(Key::A));
    let events = mgr.update(ms(0)).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind(), InputKind::Key { key: Key::A, .. })));
    assert_eq!(mgr.faults().len(), 1);
    assert_eq!(mgr.faults()[0].device.as_str(), "bad");
    assert_eq!(mgr.faults()[0].consecutive, 1);
    assert!(!mgr.faults()[0].removed);

    let events = mgr.update(ms(16)).unwrap();
    let removed: Vec<_> = events
        .iter()
        .filter(|e| change_of(e.kind()) == Some(DeviceChange::Removed))
        .map(|e| e.device().id().as_str().to_string())
        .collect();
    assert_eq!(removed, vec!["bad"]);
    assert!(mgr.faults()[0].removed);
    assert!(mgr.is_key_down(Key::A));

    mgr.update(ms(32)).unwrap();
    assert!(mgr.faults().is_empty());
    assert_eq!(mgr.devices().count(), 1);
}

#[test]
fn duplicate_ids_from_a_source_abort_the_tick() {
    let (source, handle) = VirtualSource::new("sim");
    let mut mgr = InputManager::new();
    mgr.add_source(source);
    mgr.add_device(KeyboardDevice::new("kbd", "Built-in")).unwrap();
    mgr.update(ms(0)).unwrap();

    handle.add_device(KeyboardDevice::new("kbd", "USB"));
    let err = mgr.update(ms(16)).unwrap_err();
    assert!(matches!(err, InputError::DuplicateDevice(ref id) if id.as_str() == "kbd"));

    let names: Vec<_> = mgr.devices().map(|d| d.name.clone()).collect();
    assert_eq!(names, vec!["Built-in"]);
}

#[test]
fn changes_around_a_duplicate_survive_the_failed_tick() {
    let (source, handle) = VirtualSource::new("sim");
    let mut mgr = InputManager::new();
    mgr.add_source(source);
    mgr.add_device(KeyboardDevice::new("kbd", "Built-in")).unwrap();
    mgr.update(ms(0)).unwrap();

    handle.add_device(TouchDevice::new("pad", "Touchpad"));
    handle.add_device(KeyboardDevice::new("kbd", "USB"));
    handle.add_device(TouchDevice::new("screen", "Screen"));
    assert!(mgr.update(ms(16)).is_err());

    let events = mgr.update(ms(32)).unwrap().to_vec();
    let added: Vec<_> = events
        .iter()
        .filter(|e| change_of(e.kind()) == Some(DeviceChange::Added))
        .map(|e| e.device().id().as_str().to_string())
        .collect();
    assert_eq!(added, vec!["pad", "screen"]);
    assert_eq!(events[0].time(), ms(16));
    assert!(events[0].device().is_connected());

    let ids: Vec<_> = mgr.devices().map(|d| d.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["kbd", "pad", "screen"]);
    assert!(mgr.update(ms(48)).unwrap().is_empty());
}

#[test]
fn notices_come_first_then_events_by_time() {
    let (source, handle) = VirtualSource::new("sim");
    let mut mgr = InputManager::new();
    mgr.add_source(source);

    let touch = TouchDevice::new("touch", "Screen");
    let contacts = touch.sender();
    handle.add_device(touch);
    mgr.update(ms(0)).unwrap();

    let kbd = KeyboardDevice::new("kbd", "Keyboard");
    let keys = kbd.sender();
    handle.add_device(kbd);
    keys.send(KeyboardSample::Down(Key::Enter));
    contacts.send(Contact::new(1, Vec2::new(0.5, 0.5), ContactPhase::Began, ms(40)));
    contacts.send(Contact::new(1, Vec2::new(0.6, 0.5), ContactPhase::Moved, ms(45)));
    let events = mgr.update(ms(50)).unwrap();

    assert_eq!(change_of(events[0].kind()), Some(DeviceChange::Added));
    let times: Vec<_> = events.iter().skip(1).map(|e| e.time()).collect();
    assert_eq!(times, vec![ms(40), ms(45), ms(50)]);
    assert!(matches!(events[3].kind(), InputKind::Key { key: Key::Enter, .. }));
    let seqs: Vec<_> = events.iter().map(|e| e.seq()).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
}

#[test]
fn sensors_report_only_while_enabled() {
    let mut mgr = InputManager::new();
    let gyro = SensorDevice::new("gyro", "Gyroscope", SensorKind::Gyroscope);
    let feed = gyro.feed();
    mgr.add_device(gyro).unwrap();
    mgr.update(ms(0)).unwrap();

    feed.update_sensor_data(&[1.0, 2.0, 3.0]);
    mgr.update(ms(16)).unwrap();
    assert_eq!(mgr.sensor_reading(SensorKind::Gyroscope), None);

    feed.set_enabled(true);
    feed.update_sensor_data(&[1.0, -2.0, 0.5]);
    feed.update_sensor_data(&[f32::NAN, 0.0, 0.0]);
    mgr.update(ms(32)).unwrap();
    assert_eq!(
        mgr.sensor_reading(SensorKind::Gyroscope),
        Some(SensorReading::RotationRate(Vec3::new(-1.0, 2.0, -0.5)))
    );

    feed.set_enabled(false);
    let events = mgr.update(ms(48)).unwrap();
    assert!(events.iter().any(|e| matches!(
        e.kind(),
        InputKind::SensorChanged { reading: None, .. }
    )));
    assert_eq!(mgr.sensor_reading(SensorKind::Gyroscope), None);
}

#[test]
fn text_input_is_per_tick() {
    let mut mgr = InputManager::new();
    let kbd = KeyboardDevice::new("kbd", "Keyboard");
    let keys = kbd.sender();
    mgr.add_device(kbd).unwrap();

    keys.send(KeyboardSample::Text("hé".into()));
    keys.send(KeyboardSample::Text("llo".into()));
    mgr.update(ms(0)).unwrap();
    assert_eq!(mgr.text_input(), "héllo");

    mgr.update(ms(16)).unwrap();
    assert_eq!(mgr.text_input(), "");
}
