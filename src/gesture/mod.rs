//! Gesture configuration, events and the ordered gesture set.
//!
//! A gesture is described by a [`GestureConfig`] (what to look for) and registered in a
//! [`GestureSet`]. The [`GestureRecognizer`] runs one independent state machine per
//! registered config over the touch contact stream and reports [`GestureEvent`]s.
//!
//! All distances are in normalized surface coordinates; all durations are measured on
//! the tick clock handed to [`InputManager::update`](crate::manager::InputManager::update).

pub mod recognizer;

pub use recognizer::{GestureRecognizer, RecognizerPhase};

use crate::device::DeviceId;
use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Direction constraint for flicks and drags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureShape {
    #[default]
    Free,
    Horizontal,
    Vertical,
}

impl GestureShape {
    /// Whether `translation` stays within `margin` on the axis this shape forbids.
    pub(crate) fn within_margin(self, translation: Vec2, margin: Vec2) -> bool {
        match self {
            GestureShape::Free => true,
            GestureShape::Horizontal => translation.y.abs() <= margin.y,
            GestureShape::Vertical => translation.x.abs() <= margin.x,
        }
    }

    /// Project a movement onto the allowed axis.
    pub(crate) fn constrain(self, v: Vec2) -> Vec2 {
        match self {
            GestureShape::Free => v,
            GestureShape::Horizontal => Vec2::new(v.x, 0.0),
            GestureShape::Vertical => Vec2::new(0.0, v.y),
        }
    }
}

/// One or more quick presses without significant movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    pub fingers: u32,
    /// Taps in the sequence before the gesture fires (2 = double tap).
    pub required_taps: u32,
    #[serde(with = "crate::config::duration_ms")]
    pub max_press_time: Duration,
    pub max_press_distance: f32,
    #[serde(with = "crate::config::duration_ms")]
    pub max_time_between_taps: Duration,
    pub max_distance_between_taps: f32,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            fingers: 1,
            required_taps: 1,
            max_press_time: Duration::from_millis(250),
            max_press_distance: 0.02,
            max_time_between_taps: Duration::from_millis(350),
            max_distance_between_taps: 0.04,
        }
    }
}

/// A fast, short stroke that ends with the fingers lifting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickConfig {
    pub fingers: u32,
    pub shape: GestureShape,
    pub min_length: f32,
    /// Surface units per second.
    pub min_average_speed: f32,
    #[serde(with = "crate::config::duration_ms")]
    pub max_duration: Duration,
    /// Off-axis tolerance for shaped flicks.
    pub allowed_error_margin: Vec2,
}

impl Default for FlickConfig {
    fn default() -> Self {
        Self {
            fingers: 1,
            shape: GestureShape::Free,
            min_length: 0.04,
            min_average_speed: 0.4,
            max_duration: Duration::from_millis(500),
            allowed_error_margin: Vec2::new(0.02, 0.02),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub fingers: u32,
    pub shape: GestureShape,
    /// Movement needed before the drag begins.
    pub min_distance: f32,
    pub allowed_error_margin: Vec2,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            fingers: 1,
            shape: GestureShape::Free,
            min_distance: 0.02,
            allowed_error_margin: Vec2::new(0.02, 0.02),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongPressConfig {
    pub fingers: u32,
    #[serde(with = "crate::config::duration_ms")]
    pub required_press_time: Duration,
    pub max_translation: f32,
}

impl Default for LongPressConfig {
    fn default() -> Self {
        Self {
            fingers: 1,
            required_press_time: Duration::from_secs(1),
            max_translation: 0.02,
        }
    }
}

/// Two-finger translate / pinch / rotate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub min_translation: f32,
    /// Minimum `|scale - 1|` before the gesture begins.
    pub min_scale_ratio: f32,
    /// Radians.
    pub min_rotation: f32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            min_translation: 0.02,
            min_scale_ratio: 0.05,
            min_rotation: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GestureConfig {
    Tap(TapConfig),
    Flick(FlickConfig),
    Drag(DragConfig),
    LongPress(LongPressConfig),
    Composite(CompositeConfig),
}

impl GestureConfig {
    pub fn gesture_type(&self) -> GestureType {
        match self {
            GestureConfig::Tap(_) => GestureType::Tap,
            GestureConfig::Flick(_) => GestureType::Flick,
            GestureConfig::Drag(_) => GestureType::Drag,
            GestureConfig::LongPress(_) => GestureType::LongPress,
            GestureConfig::Composite(_) => GestureType::Composite,
        }
    }

    /// Number of contacts the gesture is made with.
    pub fn fingers(&self) -> u32 {
        match self {
            GestureConfig::Tap(c) => c.fingers,
            GestureConfig::Flick(c) => c.fingers,
            GestureConfig::Drag(c) => c.fingers,
            GestureConfig::LongPress(c) => c.fingers,
            GestureConfig::Composite(_) => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureType {
    Tap,
    Flick,
    Drag,
    LongPress,
    Composite,
}

/// Discrete gestures report `Occurred`; continuous ones `Began`, `Changed`..., `Ended`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Occurred,
}

/// Handle of a config registered in a [`GestureSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GestureId(u32);

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gesture#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureDetail {
    Tap {
        position: Vec2,
        /// Taps in the completed sequence.
        taps: u32,
    },
    Flick {
        start: Vec2,
        end: Vec2,
        /// `end - start`.
        translation: Vec2,
        average_speed: f32,
    },
    Drag {
        start: Vec2,
        position: Vec2,
        delta: Vec2,
        total: Vec2,
    },
    LongPress {
        position: Vec2,
    },
    Composite {
        center: Vec2,
        delta_translation: Vec2,
        total_translation: Vec2,
        /// Radians, counter-clockwise positive.
        delta_rotation: f32,
        total_rotation: f32,
        delta_scale: f32,
        total_scale: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GestureEvent {
    pub gesture: GestureId,
    /// Surface the gesture was made on.
    pub device: DeviceId,
    pub gesture_type: GestureType,
    pub phase: GesturePhase,
    pub fingers: u32,
    /// When the event was produced.
    pub time: Duration,
    /// Time since the first contact of the gesture began.
    pub elapsed: Duration,
    pub detail: GestureDetail,
}

/// Membership change recorded by a [`GestureSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureSetChange {
    Added(GestureId),
    Removed(GestureId),
}

/// Ordered collection of active gesture configs.
///
/// Every add/remove is recorded so the recognizer can start or retire the matching
/// machine on its next sync.
#[derive(Debug, Default)]
pub struct GestureSet {
    next_id: u32,
    entries: Vec<(GestureId, GestureConfig)>,
    changes: Vec<GestureSetChange>,
}

impl GestureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, config: GestureConfig) -> GestureId {
        let id = GestureId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, config));
        self.changes.push(GestureSetChange::Added(id));
        id
    }

    pub fn remove(&mut self, id: GestureId) -> Option<GestureConfig> {
        let idx = self.entries.iter().position(|(gid, _)| *gid == id)?;
        let (_, config) = self.entries.remove(idx);
        self.changes.push(GestureSetChange::Removed(id));
        Some(config)
    }

    pub fn clear(&mut self) {
        for (id, _) in self.entries.drain(..) {
            self.changes.push(GestureSetChange::Removed(id));
        }
    }

    pub fn get(&self, id: GestureId) -> Option<&GestureConfig> {
        self.entries
            .iter()
            .find(|(gid, _)| *gid == id)
            .map(|(_, c)| c)
    }

    /// Configs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (GestureId, &GestureConfig)> {
        self.entries.iter().map(|(id, c)| (*id, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn take_changes(&mut self) -> Vec<GestureSetChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_records_membership_changes_in_order() {
        let mut set = GestureSet::new();
        let tap = set.add(GestureConfig::Tap(TapConfig::default()));
        let drag = set.add(GestureConfig::Drag(DragConfig::default()));
        assert!(set.remove(tap).is_some());
        assert!(set.remove(tap).is_none());

        assert_eq!(
            set.take_changes(),
            vec![
                GestureSetChange::Added(tap),
                GestureSetChange::Added(drag),
                GestureSetChange::Removed(tap),
            ]
        );
        assert!(set.take_changes().is_empty());
        assert_eq!(set.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![drag]);
    }

    #[test]
    fn configs_deserialize_with_defaults() {
        let cfg: GestureConfig = serde_json::from_str(
            r#"{ "type": "Flick", "shape": "Horizontal", "max_duration": 300 }"#,
        )
        .unwrap();
        let GestureConfig::Flick(flick) = cfg else {
            panic!("expected flick");
        };
        assert_eq!(flick.shape, GestureShape::Horizontal);
        assert_eq!(flick.max_duration, Duration::from_millis(300));
        assert_eq!(flick.min_length, FlickConfig::default().min_length);
    }

    #[test]
    fn shapes_constrain_off_axis() {
        let margin = Vec2::new(0.1, 0.1);
        assert!(GestureShape::Horizontal.within_margin(Vec2::new(5.0, 0.05), margin));
        assert!(!GestureShape::Horizontal.within_margin(Vec2::new(5.0, 0.5), margin));
        assert!(GestureShape::Vertical.within_margin(Vec2::new(0.0, 5.0), margin));
        assert_eq!(
            GestureShape::Vertical.constrain(Vec2::new(1.0, 2.0)),
            Vec2::new(0.0, 2.0)
        );
    }
}
