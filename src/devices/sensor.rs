//! Motion sensor adapters.
//!
//! Each [`SensorDevice`] wraps one physical sensor. The platform callback keeps a
//! [`SensorFeed`] and calls [`SensorFeed::update_sensor_data`] with the raw float array
//! the OS delivered. At poll time the device normalizes the newest sample of the tick
//! into a [`SensorReading`]; malformed samples are dropped and the previous reading stays.
//!
//! Gyroscope rates are sign-inverted so rotations follow the right-handed convention
//! used everywhere else; all other sensors pass through unchanged.
//!
//! Sensors start disabled. While disabled, samples are ignored and the device holds no
//! reading; disabling a sensor that has a reading emits `SensorChanged { reading: None }`.

use crate::device::{Capability, Device, DeviceId, PollCtx};
use crate::error::{DeviceFault, SampleError};
use crate::event::InputKind;
use crate::math::{Quaternion, Vec3};
use crate::metadata::DeviceMeta;
use crate::sample::{SampleQueue, SampleSender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Total acceleration including gravity (m/s²).
    Accelerometer,
    /// Acceleration with gravity removed.
    UserAcceleration,
    Gravity,
    /// Rotation rate around each axis (rad/s).
    Gyroscope,
    /// Heading relative to magnetic north (radians).
    Compass,
    /// Device attitude as a quaternion `[x, y, z, w]`.
    Orientation,
}

impl SensorKind {
    /// Number of floats in one raw sample.
    pub fn sample_len(self) -> usize {
        match self {
            SensorKind::Accelerometer
            | SensorKind::UserAcceleration
            | SensorKind::Gravity
            | SensorKind::Gyroscope => 3,
            SensorKind::Compass => 1,
            SensorKind::Orientation => 4,
        }
    }
}

/// A normalized sensor reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SensorReading {
    Acceleration(Vec3),
    UserAcceleration(Vec3),
    Gravity(Vec3),
    RotationRate(Vec3),
    Heading(f32),
    Orientation(Quaternion),
}

impl SensorReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Acceleration(_) => SensorKind::Accelerometer,
            SensorReading::UserAcceleration(_) => SensorKind::UserAcceleration,
            SensorReading::Gravity(_) => SensorKind::Gravity,
            SensorReading::RotationRate(_) => SensorKind::Gyroscope,
            SensorReading::Heading(_) => SensorKind::Compass,
            SensorReading::Orientation(_) => SensorKind::Orientation,
        }
    }

    /// The vector payload of the three-axis sensors.
    pub fn vector(&self) -> Option<Vec3> {
        match *self {
            SensorReading::Acceleration(v)
            | SensorReading::UserAcceleration(v)
            | SensorReading::Gravity(v)
            | SensorReading::RotationRate(v) => Some(v),
            SensorReading::Heading(_) | SensorReading::Orientation(_) => None,
        }
    }

    /// `(yaw, pitch, roll)` for orientation readings.
    pub fn yaw_pitch_roll(&self) -> Option<(f32, f32, f32)> {
        match self {
            SensorReading::Orientation(q) => Some(q.yaw_pitch_roll()),
            _ => None,
        }
    }
}

/// Turn one raw platform sample into a reading.
pub fn normalize(kind: SensorKind, raw: &[f32]) -> Result<SensorReading, SampleError> {
    let expected = kind.sample_len();
    if raw.len() != expected {
        return Err(SampleError::WrongLength {
            expected,
            actual: raw.len(),
        });
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(SampleError::NonFinite);
    }

    let v3 = || Vec3::new(raw[0], raw[1], raw[2]);
    Ok(match kind {
        SensorKind::Accelerometer => SensorReading::Acceleration(v3()),
        SensorKind::UserAcceleration => SensorReading::UserAcceleration(v3()),
        SensorKind::Gravity => SensorReading::Gravity(v3()),
        SensorKind::Gyroscope => SensorReading::RotationRate(-v3()),
        SensorKind::Compass => SensorReading::Heading(raw[0]),
        SensorKind::Orientation => {
            SensorReading::Orientation(Quaternion::new(raw[0], raw[1], raw[2], raw[3]))
        }
    })
}

/// Platform-side handle of a [`SensorDevice`]. Cheap to clone, usable from any thread.
#[derive(Clone, Debug)]
pub struct SensorFeed {
    kind: SensorKind,
    samples: SampleSender<Vec<f32>>,
    enabled: Arc<AtomicBool>,
}

impl SensorFeed {
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Queue a raw reading. Ignored while the sensor is disabled.
    pub fn update_sensor_data(&self, values: &[f32]) {
        if self.is_enabled() {
            self.samples.send(values.to_vec());
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

pub struct SensorDevice {
    id: DeviceId,
    name: String,
    kind: SensorKind,
    queue: SampleQueue<Vec<f32>>,
    enabled: Arc<AtomicBool>,
    reading: Option<SensorReading>,
}

impl SensorDevice {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            queue: SampleQueue::new(),
            enabled: Arc::new(AtomicBool::new(false)),
            reading: None,
        }
    }

    pub fn feed(&self) -> SensorFeed {
        SensorFeed {
            kind: self.kind,
            samples: self.queue.sender(),
            enabled: Arc::clone(&self.enabled),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn reading(&self) -> Option<SensorReading> {
        self.reading
    }
}

impl Device for SensorDevice {
    fn poll(&mut self, _ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault> {
        let samples = self.queue.drain();

        if !self.enabled.load(Ordering::Acquire) {
            return Ok(match self.reading.take() {
                Some(_) => vec![InputKind::SensorChanged {
                    sensor: self.kind,
                    reading: None,
                }],
                None => Vec::new(),
            });
        }

        let mut latest = None;
        for raw in samples {
            match normalize(self.kind, &raw) {
                Ok(reading) => latest = Some(reading),
                Err(err) => {
                    tracing::warn!(device = %self.id, sensor = ?self.kind, %err, "discarding malformed sensor sample");
                }
            }
        }

        Ok(match latest {
            Some(reading) => {
                self.reading = Some(reading);
                vec![InputKind::SensorChanged {
                    sensor: self.kind,
                    reading: Some(reading),
                }]
            }
            None => Vec::new(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Sensor]
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::named(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx() -> PollCtx {
        PollCtx {
            now: Duration::ZERO,
            axis_epsilon: 0.001,
        }
    }

    #[test]
    fn gyroscope_is_sign_inverted() {
        let reading = normalize(SensorKind::Gyroscope, &[1.0, -2.0, 0.5]).unwrap();
        assert_eq!(reading, SensorReading::RotationRate(Vec3::new(-1.0, 2.0, -0.5)));

        let accel = normalize(SensorKind::Accelerometer, &[1.0, -2.0, 0.5]).unwrap();
        assert_eq!(accel, SensorReading::Acceleration(Vec3::new(1.0, -2.0, 0.5)));
    }

    #[test]
    fn malformed_samples_are_rejected() {
        assert_eq!(
            normalize(SensorKind::Gravity, &[0.0, 9.8]),
            Err(SampleError::WrongLength {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            normalize(SensorKind::Compass, &[f32::INFINITY]),
            Err(SampleError::NonFinite)
        );
    }

    #[test]
    fn malformed_sample_keeps_previous_reading() {
        let mut dev = SensorDevice::new("accel", "Accelerometer", SensorKind::Accelerometer);
        let feed = dev.feed();
        feed.set_enabled(true);

        feed.update_sensor_data(&[0.0, 0.0, 9.8]);
        assert_eq!(dev.poll(&ctx()).unwrap().len(), 1);

        feed.update_sensor_data(&[f32::NAN, 0.0, 9.8]);
        assert!(dev.poll(&ctx()).unwrap().is_empty());
        assert_eq!(
            dev.reading(),
            Some(SensorReading::Acceleration(Vec3::new(0.0, 0.0, 9.8)))
        );
    }

    #[test]
    fn latest_valid_sample_wins() {
        let mut dev = SensorDevice::new("compass", "Compass", SensorKind::Compass);
        let feed = dev.feed();
        feed.set_enabled(true);
        feed.update_sensor_data(&[0.1]);
        feed.update_sensor_data(&[0.2]);
        feed.update_sensor_data(&[]);

        dev.poll(&ctx()).unwrap();
        assert_eq!(dev.reading(), Some(SensorReading::Heading(0.2)));
    }

    #[test]
    fn disabled_sensor_ignores_samples_and_clears_reading() {
        let mut dev = SensorDevice::new("gyro", "Gyroscope", SensorKind::Gyroscope);
        let feed = dev.feed();

        feed.update_sensor_data(&[1.0, 1.0, 1.0]);
        assert!(dev.poll(&ctx()).unwrap().is_empty());
        assert_eq!(dev.reading(), None);

        feed.set_enabled(true);
        feed.update_sensor_data(&[1.0, 1.0, 1.0]);
        dev.poll(&ctx()).unwrap();
        assert!(dev.reading().is_some());

        feed.set_enabled(false);
        let events = dev.poll(&ctx()).unwrap();
        assert_eq!(
            events,
            vec![InputKind::SensorChanged {
                sensor: SensorKind::Gyroscope,
                reading: None
            }]
        );
        assert_eq!(dev.reading(), None);
    }

    #[test]
    fn orientation_exposes_euler_angles() {
        let reading = normalize(SensorKind::Orientation, &[0.0, 0.0, 0.0, 1.0]).unwrap();
        let (yaw, pitch, roll) = reading.yaw_pitch_roll().unwrap();
        assert!(yaw.abs() < 1e-6 && pitch.abs() < 1e-6 && roll.abs() < 1e-6);
    }
}
