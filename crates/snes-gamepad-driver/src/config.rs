//! Driver configuration

use crate::error::ConfigError;
use hid_snes_protocol::{DeviceId, known_device_ids};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_PREFIX: &str = "snes_gamepad";

/// Enumeration policy and naming for the gamepad driver.
///
/// Slot count, queue capacity and the button-to-key table are fixed at
/// compile time and are not part of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DriverConfig {
    /// Claim any non-keyboard HID interface, not just allow-listed pads.
    pub accept_any_hid: bool,
    pub allow_list: Vec<DeviceId>,
    /// Input sources are registered as `{source_prefix}{slot}`.
    pub source_prefix: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            accept_any_hid: true,
            allow_list: known_device_ids(),
            source_prefix: DEFAULT_SOURCE_PREFIX.to_string(),
        }
    }
}

impl DriverConfig {
    /// Only claim pads on the built-in allow-list.
    pub fn strict() -> Self {
        Self {
            accept_any_hid: false,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }
}
