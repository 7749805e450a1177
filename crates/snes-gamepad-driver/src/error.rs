//! Driver error types

use thiserror::Error;

/// Failure reported by the USB host for a transfer or control request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Endpoint stalled")]
    Stall,

    #[error("Transfer timed out")]
    Timeout,

    #[error("Device disconnected")]
    Disconnected,

    #[error("No transfer resources available")]
    NoResources,

    #[error("Transfer I/O error: {0}")]
    Io(String),
}

/// Failure reported by the input-source registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Input source {0} rejected")]
    Rejected(String),
}

/// Reason an attach notification was not claimed.
///
/// Every variant leaves the slot table exactly as it was before the attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("Device uses the keyboard boot protocol")]
    KeyboardProtocol,

    #[error("Device {vendor_id:04x}:{product_id:04x} is not on the allow-list")]
    NotAllowListed { vendor_id: u16, product_id: u16 },

    #[error("No free gamepad slot")]
    NoFreeSlot,

    #[error("No interrupt IN endpoint found")]
    NoInterruptEndpoint,

    #[error("Failed to start the first report read: {0}")]
    ReadStart(TransferError),

    #[error("Failed to register input source: {0}")]
    Registration(SourceError),
}

pub type AttachResult<T> = Result<T, AttachError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Input source prefix must not be empty")]
    EmptyPrefix,

    #[error("Invalid driver config: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
