//! Error types.
//!
//! Three layers, from fatal to ignorable:
//! - [`InputError`]: registry invariant violations and configuration failures. These
//!   surface to the caller of [`InputManager::update`](crate::manager::InputManager::update)
//!   or the config loaders.
//! - [`DeviceFault`]: a single device failed to poll this tick. The manager isolates it,
//!   logs it and keeps polling everyone else.
//! - [`SampleError`]: one raw sample was malformed. The adapter drops it and keeps the
//!   previous reading.

use crate::device::DeviceId;
use thiserror::Error;

/// Fatal or configuration-level failure.
#[derive(Debug, Error)]
pub enum InputError {
    /// Two live devices reported the same id. Event ordering can no longer be trusted.
    #[error("device id `{0}` is already registered")]
    DuplicateDevice(DeviceId),

    /// The caller referenced a device the manager does not own.
    #[error("no device registered under `{0}`")]
    UnknownDevice(DeviceId),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported configuration format `{0}` (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// Non-fatal failure of one device's poll.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceFault {
    #[error("device disconnected")]
    Disconnected,

    #[error("read failed: {0}")]
    Read(String),
}

/// Reason a raw sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SampleError {
    #[error("expected {expected} values, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("sample contains a non-finite value")]
    NonFinite,

    #[error("value {value} is outside [{min}, {max}]")]
    OutOfRange { value: f32, min: f32, max: f32 },
}
