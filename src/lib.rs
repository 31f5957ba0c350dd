//! Per-tick input state tracking, gesture recognition and virtual button bindings.
//!
//! Platform code pushes raw samples into devices (keyboards, mice, touch surfaces,
//! gamepads, motion sensors). Once per frame [`InputManager::update`] polls every device,
//! runs the button/axis/pointer state machines and the gesture recognizer, and returns
//! that tick's ordered [`InputEvent`]s. The accumulated [`Snapshot`] answers "is it down
//! right now" queries and is what [`VirtualButton`] bindings evaluate against.
//!
//! ```no_run
//! use std::time::Instant;
//! use tickinput::{InputManager, Key, KeyboardDevice, KeyboardSample};
//!
//! let mut input = InputManager::new();
//! let keyboard = KeyboardDevice::new("kbd0", "Keyboard");
//! let keys = keyboard.sender();
//! input.add_device(keyboard)?;
//!
//! let start = Instant::now();
//! keys.send(KeyboardSample::Down(Key::Space));
//! for event in input.update(start.elapsed())? {
//!     println!("{:?}", event.kind());
//! }
//! assert!(input.is_key_pressed(Key::Space));
//! # Ok::<(), tickinput::InputError>(())
//! ```

pub mod backends;
pub mod binding;
pub mod config;
pub mod device;
pub mod devices;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod gesture;
pub mod logger;
pub mod manager;
pub mod math;
pub mod metadata;
pub mod pointer;
pub mod sample;
pub mod snapshot;
pub mod state;

pub use backends::{DeviceSource, SourceChange, VirtualSource, VirtualSourceHandle};
pub use binding::{BindingOutput, BindingProfile, ControlPath, DeviceSelector, VirtualButton};
pub use config::InputSettings;
pub use device::*;
pub use devices::*;
pub use error::{DeviceFault, InputError, SampleError};
pub use event::*;
pub use eventbus::{EventFilter, InputEventBus, InputListener, ListenerId};
pub use filtered_listener::FilteredListener;
pub use gesture::{
    GestureConfig, GestureDetail, GestureEvent, GestureId, GesturePhase, GestureSet,
    GestureShape, GestureType,
};
pub use logger::Logger;
pub use manager::{FaultReport, InputManager};
pub use math::{Quaternion, Vec2, Vec3};
pub use metadata::{DeviceMeta, Transport};
pub use pointer::{Contact, ContactPhase, PointerEvent, PointerType};
pub use sample::{SampleQueue, SampleSender};
pub use snapshot::Snapshot;
pub use state::{AxisKind, DeviceState};
