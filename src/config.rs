//! Manager settings and their file formats.
//!
//! Settings can be built in code or loaded from TOML/JSON:
//!
//! ```toml
//! axis_epsilon = 0.002
//! max_consecutive_faults = 5
//!
//! [[gestures]]
//! type = "Tap"
//! required_taps = 2
//!
//! [bindings]
//! name = "default"
//!
//! [[bindings.bindings]]
//! action_name = "jump"
//! button = { Control = { device = { First = "Keyboard" }, control = { control_type = "Button", index = 32 } } }
//! ```

use crate::binding::BindingProfile;
use crate::error::InputError;
use crate::gesture::GestureConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Durations as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Minimum change before an absolute axis reports a new value.
    pub axis_epsilon: f32,
    /// Consecutive failed polls before a device is dropped.
    pub max_consecutive_faults: u32,
    /// Gestures registered when the manager is built.
    pub gestures: Vec<GestureConfig>,
    pub bindings: BindingProfile,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            axis_epsilon: 0.001,
            max_consecutive_faults: 3,
            gestures: Vec::new(),
            bindings: BindingProfile::default(),
        }
    }
}

impl InputSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, InputError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load settings from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Self::from_toml_str(&std::fs::read_to_string(path)?),
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(InputError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn to_json_string(&self) -> Result<String, InputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
