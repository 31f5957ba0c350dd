//! Descriptive device metadata.
//!
//! [`DeviceMeta`] is filled by whoever constructs a device (usually a
//! [`DeviceSource`](crate::backends::DeviceSource)) and copied into the device's
//! [`DeviceIdentity`](crate::device::DeviceIdentity) at registration. It never affects
//! input semantics; it exists for settings screens, logs and re-identifying a device
//! across sessions. Unknown fields stay `None`.

use serde::{Deserialize, Serialize};

/// How a device is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// Part of the machine (laptop keyboard, phone touchscreen, IMU).
    Builtin,
    Usb,
    Bluetooth,
    /// Injected by software (tests, replays, remote input).
    Virtual,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub transport: Option<Transport>,
    /// User-facing product name.
    pub product: Option<String>,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    /// Opaque OS handle or path, for diagnostics only.
    pub platform_handle: Option<String>,
    /// Simultaneous contacts a touch surface can track.
    pub max_contacts: Option<u32>,
    /// Nominal sensor update rate.
    pub update_rate_hz: Option<f32>,
}

impl DeviceMeta {
    pub fn named(product: impl Into<String>) -> Self {
        Self {
            product: Some(product.into()),
            ..Self::default()
        }
    }

    pub fn virtual_device(product: impl Into<String>) -> Self {
        Self::named(product).with_transport(Transport::Virtual)
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.transport == Some(Transport::Virtual)
    }

    /// Stable `vendor:product` key when both ids are known.
    pub fn hardware_key(&self) -> Option<String> {
        Some(format!("{:04x}:{:04x}", self.vendor_id?, self.product_id?))
    }
}
