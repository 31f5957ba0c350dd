use std::time::Duration;
use tickinput::gesture::{
    CompositeConfig, DragConfig, FlickConfig, LongPressConfig, RecognizerPhase, TapConfig,
};
use tickinput::{
    Contact, ContactPhase, GestureConfig, GestureDetail, GestureEvent, GesturePhase, GestureType,
    InputEvent, InputKind, InputManager, InputSettings, SampleSender, TouchDevice, Vec2,
};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn setup(gestures: Vec<GestureConfig>) -> (InputManager, SampleSender<Contact>) {
    let mut mgr = InputManager::with_settings(InputSettings {
        gestures,
        ..InputSettings::default()
    });
    let touch = TouchDevice::new("touch", "Screen");
    let tx = touch.sender();
    mgr.add_device(touch).unwrap();
    mgr.update(ms(0)).unwrap();
    (mgr, tx)
}

fn touch(tx: &SampleSender<Contact>, id: u32, x: f32, y: f32, phase: ContactPhase, t: u64) {
    tx.send(Contact::new(id, Vec2::new(x, y), phase, ms(t)));
}

fn gestures(events: &[InputEvent]) -> Vec<GestureEvent> {
    events
        .iter()
        .filter_map(|e| match e.kind() {
            InputKind::Gesture(g) => Some(g.clone()),
            _ => None,
        })
        .collect()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn flick_reports_exact_positions() {
    let (mut mgr, tx) = setup(vec![GestureConfig::Flick(FlickConfig::default())]);
    touch(&tx, 1, 0.0, 0.0, ContactPhase::Began, 100);
    touch(&tx, 1, 5.0, 0.0, ContactPhase::Moved, 150);
    touch(&tx, 1, 10.0, 0.0, ContactPhase::Ended, 200);
    let events = mgr.update(ms(200)).unwrap();

    let found = gestures(events);
    assert_eq!(found.len(), 1);
    let flick = &found[0];
    assert_eq!(flick.gesture_type, GestureType::Flick);
    assert_eq!(flick.phase, GesturePhase::Occurred);
    assert_eq!(flick.device.as_str(), "touch");
    assert_eq!(flick.elapsed, ms(100));
    match flick.detail {
        GestureDetail::Flick {
            start,
            end,
            translation,
            average_speed,
        } => {
            assert_eq!(start, Vec2::new(0.0, 0.0));
            assert_eq!(end, Vec2::new(10.0, 0.0));
            assert_eq!(translation, Vec2::new(10.0, 0.0));
            assert!(approx(average_speed, 100.0));
        }
        ref other => panic!("unexpected detail {other:?}"),
    }

    // The gesture event follows the pointer event that completed it.
    let last = events.last().unwrap();
    assert!(matches!(last.kind(), InputKind::Gesture(_)));
    assert_eq!(last.device().id().as_str(), "touch");
}

#[test]
fn tap_and_flick_are_told_apart() {
    let (mut mgr, tx) = setup(vec![
        GestureConfig::Tap(TapConfig::default()),
        GestureConfig::Flick(FlickConfig::default()),
    ]);

    // Short, still press: tap only.
    touch(&tx, 1, 0.5, 0.5, ContactPhase::Began, 100);
    touch(&tx, 1, 0.5, 0.5, ContactPhase::Ended, 150);
    let kinds: Vec<_> = gestures(mgr.update(ms(150)).unwrap())
        .into_iter()
        .map(|g| g.gesture_type)
        .collect();
    assert_eq!(kinds, vec![GestureType::Tap]);

    // Fast stroke: flick only.
    touch(&tx, 2, 0.1, 0.5, ContactPhase::Began, 400);
    touch(&tx, 2, 0.3, 0.5, ContactPhase::Moved, 450);
    touch(&tx, 2, 0.5, 0.5, ContactPhase::Ended, 500);
    let kinds: Vec<_> = gestures(mgr.update(ms(500)).unwrap())
        .into_iter()
        .map(|g| g.gesture_type)
        .collect();
    assert_eq!(kinds, vec![GestureType::Flick]);

    // Slow stroke: neither.
    touch(&tx, 3, 0.1, 0.5, ContactPhase::Began, 1000);
    assert!(gestures(mgr.update(ms(1000)).unwrap()).is_empty());
    touch(&tx, 3, 0.5, 0.5, ContactPhase::Ended, 1900);
    assert!(gestures(mgr.update(ms(1900)).unwrap()).is_empty());
}

#[test]
fn double_tap_counts_both_taps() {
    let (mut mgr, tx) = setup(vec![GestureConfig::Tap(TapConfig {
        required_taps: 2,
        ..TapConfig::default()
    })]);

    touch(&tx, 1, 0.5, 0.5, ContactPhase::Began, 100);
    touch(&tx, 1, 0.5, 0.5, ContactPhase::Ended, 150);
    assert!(gestures(mgr.update(ms(150)).unwrap()).is_empty());

    touch(&tx, 1, 0.51, 0.5, ContactPhase::Began, 300);
    touch(&tx, 1, 0.51, 0.5, ContactPhase::Ended, 350);
    let found = gestures(mgr.update(ms(350)).unwrap());
    assert_eq!(found.len(), 1);
    assert!(matches!(found[0].detail, GestureDetail::Tap { taps: 2, .. }));
}

#[test]
fn long_press_fires_on_the_tick_clock() {
    let (mut mgr, tx) = setup(vec![GestureConfig::LongPress(LongPressConfig::default())]);
    touch(&tx, 1, 0.5, 0.5, ContactPhase::Began, 100);
    assert!(gestures(mgr.update(ms(100)).unwrap()).is_empty());
    assert!(gestures(mgr.update(ms(600)).unwrap()).is_empty());

    let found = gestures(mgr.update(ms(1200)).unwrap());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].gesture_type, GestureType::LongPress);
    assert_eq!(found[0].time, ms(1200));

    touch(&tx, 1, 0.5, 0.5, ContactPhase::Ended, 1300);
    assert!(gestures(mgr.update(ms(1300)).unwrap()).is_empty());
}

#[test]
fn drag_begins_changes_and_ends() {
    let (mut mgr, tx) = setup(vec![GestureConfig::Drag(DragConfig::default())]);
    touch(&tx, 1, 0.2, 0.2, ContactPhase::Began, 10);
    touch(&tx, 1, 0.3, 0.2, ContactPhase::Moved, 20);
    touch(&tx, 1, 0.4, 0.2, ContactPhase::Moved, 30);
    touch(&tx, 1, 0.4, 0.2, ContactPhase::Ended, 40);
    let found = gestures(mgr.update(ms(40)).unwrap());

    let phases: Vec<_> = found.iter().map(|g| g.phase).collect();
    assert_eq!(
        phases,
        vec![GesturePhase::Began, GesturePhase::Changed, GesturePhase::Ended]
    );
    match found[2].detail {
        GestureDetail::Drag { total, .. } => {
            assert!(approx(total.x, 0.2));
            assert!(approx(total.y, 0.0));
        }
        ref other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn unplugging_the_surface_cancels_silently() {
    let (mut mgr, tx) = setup(vec![GestureConfig::Drag(DragConfig::default())]);
    touch(&tx, 1, 0.2, 0.2, ContactPhase::Began, 10);
    touch(&tx, 1, 0.4, 0.2, ContactPhase::Moved, 20);
    assert_eq!(gestures(mgr.update(ms(20)).unwrap()).len(), 1);

    mgr.remove_device(&"touch".into()).unwrap();
    let events = mgr.update(ms(40)).unwrap();
    assert_eq!(events.len(), 1);
    assert!(gestures(events).is_empty());
}

#[test]
fn pinch_reports_scale() {
    let (mut mgr, tx) = setup(vec![GestureConfig::Composite(CompositeConfig::default())]);
    touch(&tx, 1, 0.4, 0.5, ContactPhase::Began, 10);
    touch(&tx, 2, 0.6, 0.5, ContactPhase::Began, 10);
    touch(&tx, 2, 0.8, 0.5, ContactPhase::Moved, 20);
    let found = gestures(mgr.update(ms(20)).unwrap());

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].phase, GesturePhase::Began);
    assert_eq!(found[0].fingers, 2);
    match found[0].detail {
        GestureDetail::Composite {
            total_scale,
            total_rotation,
            ..
        } => {
            assert!(approx(total_scale, 2.0));
            assert!(approx(total_rotation, 0.0));
        }
        ref other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn gesture_set_changes_apply_next_tick() {
    let (mut mgr, _tx) = setup(Vec::new());
    let id = mgr
        .gestures_mut()
        .add(GestureConfig::Tap(TapConfig::default()));
    assert_eq!(mgr.gesture_phase(id), None);

    mgr.update(ms(16)).unwrap();
    assert_eq!(mgr.gesture_phase(id), Some(RecognizerPhase::Idle));

    mgr.gestures_mut().remove(id);
    mgr.update(ms(32)).unwrap();
    assert_eq!(mgr.gesture_phase(id), None);
}
