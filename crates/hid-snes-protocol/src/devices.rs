//! Known SNES controller identities

use serde::{Deserialize, Serialize};

/// USB vendor/product pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownDevice {
    pub id: DeviceId,
    pub name: &'static str,
}

const fn known(vendor_id: u16, product_id: u16, name: &'static str) -> KnownDevice {
    KnownDevice {
        id: DeviceId::new(vendor_id, product_id),
        name,
    }
}

/// Pads that are known to send the 8-byte SNES report layout.
pub static KNOWN_DEVICES: [KnownDevice; 9] = [
    known(0x0810, 0xE501, "Generic SNES"),
    known(0x0079, 0x0011, "DragonRise"),
    known(0x0583, 0x2060, "iBuffalo SNES"),
    known(0x2DC8, 0x9018, "8BitDo SN30"),
    known(0x12BD, 0xD015, "Generic 2-pack"),
    known(0x1A34, 0x0802, "USB Gamepad"),
    known(0x0810, 0x0001, "Generic Gamepad"),
    known(0x0079, 0x0006, "DragonRise v2"),
    known(0x046D, 0xC218, "Logitech F510"),
];

/// Fallback name for HID devices that are not in [`KNOWN_DEVICES`].
pub const GENERIC_DEVICE_NAME: &str = "Generic HID Gamepad";

pub fn known_device(id: DeviceId) -> Option<&'static KnownDevice> {
    KNOWN_DEVICES.iter().find(|device| device.id == id)
}

pub fn device_name(id: DeviceId) -> &'static str {
    known_device(id).map_or(GENERIC_DEVICE_NAME, |device| device.name)
}

pub fn known_device_ids() -> Vec<DeviceId> {
    KNOWN_DEVICES.iter().map(|device| device.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_device_lookup() {
        let sn30 = DeviceId::new(0x2DC8, 0x9018);
        assert_eq!(device_name(sn30), "8BitDo SN30");
        assert!(known_device(sn30).is_some());
    }

    #[test]
    fn test_unknown_device_is_generic() {
        let id = DeviceId::new(0x1234, 0x5678);
        assert!(known_device(id).is_none());
        assert_eq!(device_name(id), GENERIC_DEVICE_NAME);
    }

    #[test]
    fn test_known_ids_unique() {
        let ids = known_device_ids();
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_device_id_display() {
        assert_eq!(DeviceId::new(0x0810, 0xE501).to_string(), "0810:e501");
    }
}
