//! Enumeration filter deciding which HID interfaces the driver claims

use crate::config::DriverConfig;
use crate::error::{AttachError, AttachResult};
use hid_snes_protocol::{DeviceId, HID_PROTOCOL_KEYBOARD};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    accept_any_hid: bool,
    allow_list: Vec<DeviceId>,
}

impl DeviceFilter {
    pub fn new(accept_any_hid: bool, allow_list: Vec<DeviceId>) -> Self {
        Self {
            accept_any_hid,
            allow_list,
        }
    }

    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.accept_any_hid, config.allow_list.clone())
    }

    pub fn is_allow_listed(&self, id: DeviceId) -> bool {
        self.allow_list.contains(&id)
    }

    /// Keyboards are always refused so the keyboard driver keeps them.
    pub fn check(&self, id: DeviceId, protocol: u8) -> AttachResult<()> {
        if protocol == HID_PROTOCOL_KEYBOARD {
            debug!(%id, "skipping keyboard device (protocol=1)");
            return Err(AttachError::KeyboardProtocol);
        }

        if self.is_allow_listed(id) || self.accept_any_hid {
            return Ok(());
        }

        debug!(%id, "device not in supported list");
        Err(AttachError::NotAllowListed {
            vendor_id: id.vendor_id,
            product_id: id.product_id,
        })
    }

    pub fn accepts(&self, id: DeviceId, protocol: u8) -> bool {
        self.check(id, protocol).is_ok()
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}
