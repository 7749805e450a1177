//! Polling driver for SNES-style USB gamepads
//!
//! Binds up to [`MAX_GAMEPADS`] HID gamepads, keeps one interrupt read in
//! flight per pad, and exposes each pad as an input source that yields one
//! navigation key per poll.
//!
//! The driver owns no host objects. The USB stack ([`UsbHost`]) and the
//! input-source registry ([`InputSources`]) are passed into every call.
//!
//! ## Features
//! - Attach filtering by HID protocol and vendor/product allow-list
//! - Best-effort boot-protocol and idle-rate setup on attach
//! - Bounded per-device key queue that overwrites the oldest key
//! - Scripted mock host for tests

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod driver;
pub mod error;
pub mod filter;
pub mod host;
pub mod mock;
pub mod queue;
pub mod registry;
pub mod session;

pub use config::*;
pub use driver::*;
pub use error::*;
pub use filter::*;
pub use host::*;
pub use queue::*;
pub use registry::*;
pub use session::*;

/// Number of gamepad slots.
pub const MAX_GAMEPADS: usize = 8;

/// Per-device key queue capacity.
pub const KEY_QUEUE_CAPACITY: usize = 32;
