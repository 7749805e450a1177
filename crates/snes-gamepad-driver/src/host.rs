//! Host collaborator traits
//!
//! The driver never owns the USB stack or the terminal. It reaches both
//! through the traits below, which are passed by `&mut` into every entry
//! point.

use crate::error::{SourceError, TransferError};
use crate::registry::SlotIndex;
use hid_snes_protocol::{DeviceId, REPORT_SIZE};
use std::fmt;

/// USB interface class code for HID.
pub const USB_CLASS_HID: u8 = 0x03;

/// bmRequestType for host-to-device, class, interface.
pub const REQUEST_TYPE_CLASS_INTERFACE_OUT: u8 = 0x21;

const ENDPOINT_DIR_IN: u8 = 0x80;
const ENDPOINT_TYPE_MASK: u8 = 0x03;
const ENDPOINT_TYPE_INTERRUPT: u8 = 0x03;

/// HID class-specific requests (HID 1.11, section 7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HidRequest {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0A,
    SetProtocol = 0x0B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum HidProtocolMode {
    Boot = 0,
    Report = 1,
}

/// Zero-length OUT control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

impl ControlRequest {
    pub const fn set_protocol(interface: u8, mode: HidProtocolMode) -> Self {
        Self {
            request_type: REQUEST_TYPE_CLASS_INTERFACE_OUT,
            request: HidRequest::SetProtocol as u8,
            value: mode as u16,
            index: interface as u16,
        }
    }

    /// `rate` is in 4 ms units; 0 means "report only on change".
    pub const fn set_idle(interface: u8, rate: u8) -> Self {
        Self {
            request_type: REQUEST_TYPE_CLASS_INTERFACE_OUT,
            request: HidRequest::SetIdle as u8,
            value: (rate as u16) << 8,
            index: interface as u16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// bEndpointAddress, direction in bit 7.
    pub address: u8,
    /// bmAttributes, transfer type in bits 0..=1.
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl EndpointDescriptor {
    pub const fn interrupt_in(number: u8, max_packet_size: u16, interval: u8) -> Self {
        Self {
            address: ENDPOINT_DIR_IN | (number & 0x0F),
            attributes: ENDPOINT_TYPE_INTERRUPT,
            max_packet_size,
            interval,
        }
    }

    pub const fn number(&self) -> u8 {
        self.address & 0x0F
    }

    pub const fn is_in(&self) -> bool {
        self.address & ENDPOINT_DIR_IN != 0
    }

    pub const fn is_interrupt(&self) -> bool {
        self.attributes & ENDPOINT_TYPE_MASK == ENDPOINT_TYPE_INTERRUPT
    }

    pub const fn is_interrupt_in(&self) -> bool {
        self.is_in() && self.is_interrupt()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub number: u8,
    /// bInterfaceProtocol; 1 is a boot keyboard.
    pub protocol: u8,
    pub endpoints: Vec<EndpointDescriptor>,
}

impl InterfaceDescriptor {
    /// First interrupt IN endpoint, in descriptor order.
    pub fn interrupt_in(&self) -> Option<EndpointDescriptor> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.is_interrupt_in())
            .copied()
    }
}

/// Everything the enumeration layer hands over when it offers a device.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachRequest<D> {
    pub device: D,
    pub id: DeviceId,
    /// Zero-based configuration index; SET_CONFIGURATION uses `index + 1`.
    pub config_index: u8,
    pub interface: InterfaceDescriptor,
}

/// Registration of interest in a device class, installed at driver init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachHook {
    pub class: u8,
}

impl AttachHook {
    pub const HID: AttachHook = AttachHook {
        class: USB_CLASS_HID,
    };
}

/// Result of checking an outstanding read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    /// Still in flight.
    Pending,
    /// Completed; this many bytes were written into the buffer.
    Done(usize),
    /// Completed with a device or bus error.
    Failed(TransferError),
}

/// USB host transfer and control surface.
///
/// Nothing here may block. `start_read` returns immediately with a handle,
/// and completion is observed later through `check_read`.
pub trait UsbHost {
    /// Opaque device handle, only ever compared for equality.
    type Device: Clone + PartialEq + fmt::Debug;
    /// Handle of one outstanding read.
    type Transfer: fmt::Debug;

    fn start_read(
        &mut self,
        device: &Self::Device,
        endpoint: &EndpointDescriptor,
        len: usize,
    ) -> Result<Self::Transfer, TransferError>;

    /// Poll `transfer`. On completion the received bytes are copied into
    /// `buffer` and the handle must not be checked again.
    fn check_read(
        &mut self,
        transfer: &Self::Transfer,
        buffer: &mut [u8; REPORT_SIZE],
    ) -> ReadStatus;

    /// Cancel an outstanding read. The handle is unusable afterwards.
    fn cancel_read(&mut self, transfer: Self::Transfer);

    fn set_configuration(&mut self, device: &Self::Device, value: u8)
    -> Result<(), TransferError>;

    fn control_out(
        &mut self,
        device: &Self::Device,
        request: ControlRequest,
    ) -> Result<(), TransferError>;

    fn register_attach_hook(&mut self, hook: AttachHook);

    fn unregister_attach_hook(&mut self, hook: AttachHook);
}

/// Registry of pollable key sources owned by the text UI.
///
/// A registered source is polled by calling `GamepadDriver::poll` with the
/// `slot` it was registered under. Implementations keep that token next to
/// the handle they return.
pub trait InputSources {
    type Handle: fmt::Debug;

    fn register_source(&mut self, name: &str, slot: SlotIndex) -> Result<Self::Handle, SourceError>;

    fn unregister_source(&mut self, handle: Self::Handle);
}
