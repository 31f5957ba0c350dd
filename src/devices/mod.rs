//! Capability devices.
//!
//! Each type here implements [`Device`](crate::device::Device) for one capability and
//! owns the state machines that give it edge semantics. Platform glue never subclasses
//! them: it constructs one, keeps the sample sender (or [`sensor::SensorFeed`]) and
//! pushes raw readings from whatever thread the OS calls back on.
//!
//! | Device | Raw sample | Emits |
//! |---|---|---|
//! | [`keyboard::KeyboardDevice`] | [`keyboard::KeyboardSample`] | `Key`, `TextInput` |
//! | [`mouse::MouseDevice`] | [`mouse::MouseSample`] | `MouseButton`, `MouseWheel`, `AxisMoved`, `Pointer` |
//! | [`touch::TouchDevice`] | [`Contact`](crate::pointer::Contact) | `Pointer` |
//! | [`gamepad::GamePadDevice`] | [`gamepad::GamePadInput`] | `GamePadButton`, `AxisMoved`, `HatChanged` |
//! | [`sensor::SensorDevice`] | `&[f32]` via [`sensor::SensorFeed`] | `SensorChanged` |

pub mod gamepad;
pub mod keyboard;
pub mod mouse;
pub mod sensor;
pub mod touch;

pub use gamepad::{GamePadDevice, GamePadInput, GamePadLayout, GamePadSample};
pub use keyboard::{Key, KeyboardDevice, KeyboardSample};
pub use mouse::{MouseButton, MouseDevice, MouseSample};
pub use sensor::{SensorDevice, SensorFeed, SensorKind, SensorReading};
pub use touch::TouchDevice;
