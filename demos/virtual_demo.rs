//! Drives the manager with simulated devices and prints what comes out.
//!
//! ```sh
//! RUST_LOG=tickinput=debug cargo run --example virtual_demo
//! ```

use std::time::Duration;
use tickinput::devices::gamepad::{xbox, GamePadInput};
use tickinput::gesture::{FlickConfig, TapConfig};
use tickinput::{
    BindingProfile, Contact, ContactPhase, EventFilter, GamePadDevice, GamePadLayout,
    GamePadSample, GestureConfig, InputKind, InputManager, InputSettings, Key, KeyboardDevice,
    KeyboardSample, Logger, TouchDevice, Vec2, VirtualButton, VirtualSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), tickinput::InputError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bindings = BindingProfile::new("demo")
        .bind(
            "jump",
            VirtualButton::any([
                VirtualButton::key(Key::Space),
                VirtualButton::gamepad_button(0, xbox::A),
            ]),
        )
        .bind(
            "move",
            VirtualButton::any([
                VirtualButton::two_way(VirtualButton::key(Key::D), VirtualButton::key(Key::A)),
                VirtualButton::gamepad_axis(0, xbox::LEFT_X).deadzone(0.2),
            ]),
        );
    let mut input = InputManager::with_settings(InputSettings {
        gestures: vec![
            GestureConfig::Tap(TapConfig::default()),
            GestureConfig::Flick(FlickConfig::default()),
        ],
        bindings,
        ..InputSettings::default()
    });
    input.event_bus().add_listener(Logger::new(), EventFilter::All, None);

    let (source, plug) = VirtualSource::new("sim");
    input.add_source(source);

    let keyboard = KeyboardDevice::new("sim:kbd", "Simulated keyboard");
    let pad = GamePadDevice::new("sim:pad", "Simulated pad", GamePadLayout::xbox());
    let screen = TouchDevice::new("sim:touch", "Simulated screen");
    let keys = keyboard.sender();
    let pad_tx = pad.sender();
    let touches = screen.sender();
    plug.add_device(keyboard);
    plug.add_device(pad);
    plug.add_device(screen);

    let frame = Duration::from_millis(16);
    for tick in 0u32..8 {
        let now = frame * tick;
        match tick {
            1 => keys.send(KeyboardSample::Down(Key::Space)),
            2 => {
                keys.send(KeyboardSample::Up(Key::Space));
                pad_tx.send(GamePadInput::State(GamePadSample {
                    buttons: vec![false; 10],
                    axes: vec![0.8, 0.0, 0.0, 0.0, 0.0, 0.0],
                    hats: vec![-1],
                }));
            }
            3 => touches.send(Contact::new(1, Vec2::new(0.2, 0.5), ContactPhase::Began, now)),
            4 => {
                touches.send(Contact::new(1, Vec2::new(0.5, 0.5), ContactPhase::Moved, now));
                touches.send(Contact::new(1, Vec2::new(0.8, 0.5), ContactPhase::Ended, now));
            }
            6 => plug.remove_device("sim:pad"),
            _ => {}
        }

        let events = input.update(now)?;
        for event in events {
            if let InputKind::Gesture(g) = event.kind() {
                println!("tick {tick}: {:?} {:?} on {}", g.gesture_type, g.phase, g.device);
            }
        }
        let actions = input.resolve_bindings();
        println!(
            "tick {tick}: {} event(s), jump={} move={:.2}",
            input.events().len(),
            actions.is_active("jump"),
            actions.value("move"),
        );
    }
    Ok(())
}
