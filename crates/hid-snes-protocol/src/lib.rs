//! HID protocol implementation for SNES-style USB gamepads
//!
//! This crate describes the fixed 8-byte report sent by cheap SNES/NES
//! replica pads and turns consecutive reports into navigation key presses
//! for a text-mode menu.
//!
//! ## Report layout
//! - Byte 0: X axis (`0x00` left, `0x7F` center, `0xFF` right)
//! - Byte 1: Y axis (`0x00` up, `0x7F` center, `0xFF` down)
//! - Bytes 2-3: reserved, usually `0x7F`
//! - Byte 4: buttons, LSB first: X, A, B, Y, L, R, Select, Start
//! - Bytes 5-7: padding
//!
//! ## Features
//! - Four-way digital direction from the analog axes
//! - Rising-edge key derivation with a fixed evaluation order
//! - Table of known SNES controller identities

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod codec;
pub mod devices;
pub mod keys;
pub mod report;

pub use codec::*;
pub use devices::*;
pub use keys::*;
pub use report::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnesProtocolError {
    #[error("Invalid report size: expected {expected}, got {actual}")]
    InvalidReportSize { expected: usize, actual: usize },
}

pub type SnesProtocolResult<T> = Result<T, SnesProtocolError>;

pub const REPORT_SIZE: usize = 8;

pub const AXIS_CENTER: u8 = 0x7F;
pub const AXIS_THRESHOLD: u8 = 0x40;

pub const AXIS_X_OFFSET: usize = 0;
pub const AXIS_Y_OFFSET: usize = 1;
pub const BUTTONS_OFFSET: usize = 4;

/// HID interface protocol code used by boot keyboards.
pub const HID_PROTOCOL_KEYBOARD: u8 = 0x01;
