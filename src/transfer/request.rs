//! Blocking transfer requests and the controller submission seam

use super::{Direction, SetupPacket, TransferType};
use crate::error::Result;

/// Endpoint of a device as seen by the host core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint {
    /// Device address (0 before SET_ADDRESS)
    pub device_address: u8,
    /// Endpoint number (0-15)
    pub number: u8,
    /// Direction of data transfers (ignored for control endpoints)
    pub direction: Direction,
    /// Transfer type
    pub transfer_type: TransferType,
    /// Maximum packet size
    pub max_packet_size: u16,
}

impl Endpoint {
    /// Default control endpoint (endpoint 0) of a device
    pub const fn control(device_address: u8, max_packet_size: u16) -> Self {
        Self {
            device_address,
            number: 0,
            direction: Direction::Out,
            transfer_type: TransferType::Control,
            max_packet_size,
        }
    }

    /// Endpoint from an endpoint descriptor's bEndpointAddress and bmAttributes
    pub fn from_descriptor(device_address: u8, address: u8, attributes: u8, max_packet_size: u16) -> Self {
        Self {
            device_address,
            number: address & 0x0F,
            direction: if address & 0x80 != 0 {
                Direction::In
            } else {
                Direction::Out
            },
            transfer_type: TransferType::from_attributes(attributes),
            max_packet_size,
        }
    }

    /// bEndpointAddress encoding (number plus direction bit)
    pub fn address(&self) -> u8 {
        match self.direction {
            Direction::In => self.number | 0x80,
            Direction::Out => self.number,
        }
    }

    /// True for control endpoints
    pub fn is_control(&self) -> bool {
        self.transfer_type == TransferType::Control
    }

    /// Move the endpoint to a new device address, as endpoint 0 after a
    /// successful SET_ADDRESS
    pub fn set_device_address(&mut self, address: u8) {
        self.device_address = address;
    }
}

/// A single blocking transfer handed to the controller
///
/// Control requests carry a setup packet; data transfers do not. The
/// controller reports how many bytes moved through
/// [`UsbRequest::set_result_length`].
#[derive(Debug)]
pub struct UsbRequest<'a> {
    endpoint: &'a Endpoint,
    setup: Option<SetupPacket>,
    buffer: &'a mut [u8],
    result_length: usize,
}

impl<'a> UsbRequest<'a> {
    /// Control request with setup stage
    pub fn control(endpoint: &'a Endpoint, setup: SetupPacket, buffer: &'a mut [u8]) -> Self {
        Self {
            endpoint,
            setup: Some(setup),
            buffer,
            result_length: 0,
        }
    }

    /// Bulk or interrupt request without setup stage
    pub fn data(endpoint: &'a Endpoint, buffer: &'a mut [u8]) -> Self {
        Self {
            endpoint,
            setup: None,
            buffer,
            result_length: 0,
        }
    }

    /// Target endpoint
    pub fn endpoint(&self) -> &Endpoint {
        self.endpoint
    }

    /// Setup packet of a control request
    pub fn setup(&self) -> Option<&SetupPacket> {
        self.setup.as_ref()
    }

    /// Data stage buffer: source for OUT transfers, destination for IN
    pub fn buffer(&self) -> &[u8] {
        &*self.buffer
    }

    /// Mutable data stage buffer, for the controller to fill IN data
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut *self.buffer
    }

    /// Direction of the data stage
    pub fn direction(&self) -> Direction {
        match &self.setup {
            Some(setup) if setup.is_in() => Direction::In,
            Some(_) => Direction::Out,
            None => self.endpoint.direction,
        }
    }

    /// Record the number of bytes actually transferred, clamped to the buffer
    pub fn set_result_length(&mut self, length: usize) {
        self.result_length = length.min(self.buffer.len());
    }

    /// Bytes actually transferred
    pub fn result_length(&self) -> usize {
        self.result_length
    }
}

/// Blocking submission primitive implemented by a concrete host controller
///
/// The call returns once the request has completed, failed, or timed out.
/// `timeout_ms` of `None` waits until the controller reports an outcome.
pub trait BlockingSubmit {
    /// Run `request` to completion and record its result length
    fn submit_blocking_request(&mut self, request: &mut UsbRequest<'_>, timeout_ms: Option<u32>) -> Result<()>;
}

impl<S: BlockingSubmit + ?Sized> BlockingSubmit for &mut S {
    fn submit_blocking_request(&mut self, request: &mut UsbRequest<'_>, timeout_ms: Option<u32>) -> Result<()> {
        (**self).submit_blocking_request(request, timeout_ms)
    }
}
