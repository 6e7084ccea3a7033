//! USB transfer vocabulary and the blocking control-transfer protocol
//!
//! [`SetupPacket`] is the only bit-exact structure in the crate; everything
//! else here names the fields that go into it.

use bitflags::bitflags;

pub mod control;
pub mod request;

pub use control::ControlExecutor;
pub use request::{BlockingSubmit, Endpoint, UsbRequest};

/// USB transfer types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferType {
    /// Setup, data and status stages on endpoint 0
    Control,
    /// Bulk data
    Bulk,
    /// Periodic interrupt data
    Interrupt,
    /// Periodic isochronous data
    Isochronous,
}

impl TransferType {
    /// Decode the transfer type bits of an endpoint descriptor's bmAttributes
    pub fn from_attributes(attributes: u8) -> Self {
        match attributes & 0x03 {
            0 => Self::Control,
            1 => Self::Isochronous,
            2 => Self::Bulk,
            _ => Self::Interrupt,
        }
    }
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device to host
    In,
    /// Host to device
    Out,
}

bitflags! {
    /// bmRequestType bit definitions (USB 2.0 Table 9-2)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RequestType: u8 {
        /// Data stage direction - Bit 7 (set = device-to-host)
        const DEVICE_TO_HOST = 1 << 7;
        /// Type - Bits [6:5]
        const TYPE_MASK = 0b11 << 5;
        /// Class-specific request
        const TYPE_CLASS = 0b01 << 5;
        /// Vendor-specific request
        const TYPE_VENDOR = 0b10 << 5;
        /// Recipient - Bits [4:0]
        const RECIPIENT_MASK = 0x1F;
        /// Addressed to an interface (wIndex)
        const RECIPIENT_INTERFACE = 0x01;
        /// Addressed to an endpoint (wIndex)
        const RECIPIENT_ENDPOINT = 0x02;
        /// Addressed to something else, e.g. a hub port
        const RECIPIENT_OTHER = 0x03;
    }
}

/// Host-to-device, standard, device
pub const REQUEST_OUT: u8 = 0x00;
/// Device-to-host, standard, device
pub const REQUEST_IN: u8 = RequestType::DEVICE_TO_HOST.bits();

/// Standard request codes (USB 2.0 Table 9-4)
#[allow(missing_docs)]
pub mod request_code {
    pub const GET_STATUS: u8 = 0x00;
    pub const CLEAR_FEATURE: u8 = 0x01;
    pub const SET_FEATURE: u8 = 0x03;
    pub const SET_ADDRESS: u8 = 0x05;
    pub const GET_DESCRIPTOR: u8 = 0x06;
    pub const SET_DESCRIPTOR: u8 = 0x07;
    pub const GET_CONFIGURATION: u8 = 0x08;
    pub const SET_CONFIGURATION: u8 = 0x09;
    pub const GET_INTERFACE: u8 = 0x0A;
    pub const SET_INTERFACE: u8 = 0x0B;
}

/// Standard descriptor types (USB 2.0 Table 9-5)
#[allow(missing_docs)]
pub mod descriptor_type {
    pub const DEVICE: u8 = 0x01;
    pub const CONFIGURATION: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const INTERFACE: u8 = 0x04;
    pub const ENDPOINT: u8 = 0x05;
}

/// ENDPOINT_HALT feature selector
pub const FEATURE_ENDPOINT_HALT: u16 = 0;

/// USB Setup packet per USB 2.0 specification
///
/// Multi-byte fields are little-endian on the wire regardless of the host's
/// byte order; use [`SetupPacket::to_bytes`] to obtain the wire form.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    /// bmRequestType
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
    /// wLength
    pub length: u16,
}

impl SetupPacket {
    /// Size of a setup packet on the wire
    pub const SIZE: usize = 8;

    /// Setup packet from raw field values
    pub const fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value,
            index,
            length,
        }
    }

    /// Standard GET_DESCRIPTOR request
    pub const fn get_descriptor(desc_type: u8, desc_index: u8, language_id: u16, length: u16) -> Self {
        Self::new(
            REQUEST_IN,
            request_code::GET_DESCRIPTOR,
            ((desc_type as u16) << 8) | (desc_index as u16),
            language_id,
            length,
        )
    }

    /// Standard SET_ADDRESS request
    pub const fn set_address(address: u8) -> Self {
        Self::new(REQUEST_OUT, request_code::SET_ADDRESS, address as u16, 0, 0)
    }

    /// Standard SET_CONFIGURATION request
    pub const fn set_configuration(config_value: u8) -> Self {
        Self::new(REQUEST_OUT, request_code::SET_CONFIGURATION, config_value as u16, 0, 0)
    }

    /// Standard SET_INTERFACE request
    pub const fn set_interface(interface: u8, alternate_setting: u8) -> Self {
        Self::new(
            REQUEST_OUT | RequestType::RECIPIENT_INTERFACE.bits(),
            request_code::SET_INTERFACE,
            alternate_setting as u16,
            interface as u16,
            0,
        )
    }

    /// Standard GET_STATUS request addressed to the device
    pub const fn get_status() -> Self {
        Self::new(REQUEST_IN, request_code::GET_STATUS, 0, 0, 2)
    }

    /// Standard CLEAR_FEATURE request for endpoint halt
    pub const fn clear_halt(endpoint_address: u8) -> Self {
        Self::new(
            REQUEST_OUT | RequestType::RECIPIENT_ENDPOINT.bits(),
            request_code::CLEAR_FEATURE,
            FEATURE_ENDPOINT_HALT,
            endpoint_address as u16,
            0,
        )
    }

    /// Check if the data stage (if any) is device-to-host
    pub fn is_in(&self) -> bool {
        RequestType::from_bits_retain(self.request_type).contains(RequestType::DEVICE_TO_HOST)
    }

    /// Wire representation
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let value = self.value.to_le_bytes();
        let index = self.index.to_le_bytes();
        let length = self.length.to_le_bytes();
        [
            self.request_type,
            self.request,
            value[0],
            value[1],
            index[0],
            index[1],
            length[0],
            length[1],
        ]
    }

    /// Parse the wire representation
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }
}
