//! Blocking USB control-transfer protocol
//!
//! Builds standard requests on top of a controller's [`BlockingSubmit`]
//! primitive. Every call blocks until the controller reports an outcome;
//! none of them may run from interrupt context or inside the host's event
//! queue critical section.

use super::request::{BlockingSubmit, Endpoint, UsbRequest};
use super::{descriptor_type, request_code, SetupPacket, REQUEST_IN, REQUEST_OUT};
use crate::error::{Result, UsbError};
use crate::timer::Timer;

/// Settle time after SET_ADDRESS and SET_CONFIGURATION (USB 2.0 tDSETADDR)
pub const SETTLE_DELAY_MS: u32 = 50;

/// Length of a standard device descriptor
pub const DEVICE_DESCRIPTOR_LEN: usize = 18;

/// Length of a configuration descriptor header
pub const CONFIG_DESCRIPTOR_HEADER_LEN: usize = 9;

/// Largest configuration descriptor [`ControlExecutor::read_configuration_descriptor`] accepts
pub const MAX_CONFIG_DESCRIPTOR_LEN: usize = 256;

/// Control transfer executor bound to a controller and a timer
pub struct ControlExecutor<'a, S: BlockingSubmit + ?Sized> {
    submitter: &'a mut S,
    timer: &'a dyn Timer,
}

impl<'a, S: BlockingSubmit + ?Sized> ControlExecutor<'a, S> {
    /// Create new control executor
    pub fn new(submitter: &'a mut S, timer: &'a dyn Timer) -> Self {
        Self { submitter, timer }
    }

    /// Issue a control request and return the number of bytes transferred
    ///
    /// The setup packet's wLength is the buffer length. An empty buffer means
    /// no data stage.
    pub fn control_message(
        &mut self,
        endpoint: &Endpoint,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &mut [u8],
    ) -> Result<usize> {
        if !endpoint.is_control() {
            return Err(UsbError::InvalidParameter);
        }
        let length = u16::try_from(buffer.len()).map_err(|_| UsbError::InvalidParameter)?;

        let setup = SetupPacket::new(request_type, request, value, index, length);
        let mut urb = UsbRequest::control(endpoint, setup, buffer);

        match self.submitter.submit_blocking_request(&mut urb, None) {
            Ok(()) => Ok(urb.result_length()),
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Control request {=u8:#x} to device {} failed: {}",
                    request,
                    endpoint.device_address,
                    e
                );
                Err(e)
            }
        }
    }

    /// GET_DESCRIPTOR with explicit request type and wIndex
    pub fn get_descriptor(
        &mut self,
        endpoint: &Endpoint,
        desc_type: u8,
        desc_index: u8,
        buffer: &mut [u8],
        request_type: u8,
        language_id: u16,
    ) -> Result<usize> {
        self.control_message(
            endpoint,
            request_type,
            request_code::GET_DESCRIPTOR,
            ((desc_type as u16) << 8) | desc_index as u16,
            language_id,
            buffer,
        )
    }

    /// GET_DESCRIPTOR as a standard device-to-host request with wIndex 0
    pub fn get_standard_descriptor(
        &mut self,
        endpoint: &Endpoint,
        desc_type: u8,
        desc_index: u8,
        buffer: &mut [u8],
    ) -> Result<usize> {
        self.get_descriptor(endpoint, desc_type, desc_index, buffer, REQUEST_IN, 0)
    }

    /// SET_ADDRESS followed by the mandatory settle delay
    ///
    /// The delay runs even on a fast bus: the device may not answer on its
    /// new address before tDSETADDR has elapsed.
    pub fn set_address(&mut self, endpoint: &Endpoint, address: u8) -> Result<()> {
        self.control_message(
            endpoint,
            REQUEST_OUT,
            request_code::SET_ADDRESS,
            address as u16,
            0,
            &mut [],
        )?;

        self.timer.ms_delay(SETTLE_DELAY_MS);

        #[cfg(feature = "defmt")]
        defmt::debug!("Device address set to {}", address);

        Ok(())
    }

    /// SET_CONFIGURATION followed by the settle delay
    pub fn set_configuration(&mut self, endpoint: &Endpoint, config_value: u8) -> Result<()> {
        self.control_message(
            endpoint,
            REQUEST_OUT,
            request_code::SET_CONFIGURATION,
            config_value as u16,
            0,
            &mut [],
        )?;

        self.timer.ms_delay(SETTLE_DELAY_MS);

        Ok(())
    }

    /// CLEAR_FEATURE(ENDPOINT_HALT) for `endpoint_address` on the device
    /// behind the control endpoint
    pub fn clear_halt(&mut self, endpoint: &Endpoint, endpoint_address: u8) -> Result<()> {
        let setup = SetupPacket::clear_halt(endpoint_address);
        self.control_message(
            endpoint,
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            &mut [],
        )?;
        Ok(())
    }

    /// Bulk or interrupt transfer on a data endpoint
    ///
    /// `timeout_ms` of `None` waits for the controller's outcome.
    pub fn transfer(&mut self, endpoint: &Endpoint, buffer: &mut [u8], timeout_ms: Option<u32>) -> Result<usize> {
        if endpoint.is_control() {
            return Err(UsbError::InvalidParameter);
        }

        let mut urb = UsbRequest::data(endpoint, buffer);
        self.submitter.submit_blocking_request(&mut urb, timeout_ms)?;

        Ok(urb.result_length())
    }

    /// Helper: read the full device descriptor
    pub fn read_device_descriptor(&mut self, endpoint: &Endpoint) -> Result<[u8; DEVICE_DESCRIPTOR_LEN]> {
        let mut desc = [0u8; DEVICE_DESCRIPTOR_LEN];
        let len = self.get_standard_descriptor(endpoint, descriptor_type::DEVICE, 0, &mut desc)?;

        if len != DEVICE_DESCRIPTOR_LEN || desc[1] != descriptor_type::DEVICE {
            return Err(UsbError::InvalidDescriptor);
        }

        Ok(desc)
    }

    /// Helper: read configuration `index` with all interface and endpoint
    /// descriptors
    ///
    /// Reads the 9-byte header first to learn wTotalLength, then the whole
    /// descriptor set.
    pub fn read_configuration_descriptor(
        &mut self,
        endpoint: &Endpoint,
        index: u8,
    ) -> Result<heapless::Vec<u8, MAX_CONFIG_DESCRIPTOR_LEN>> {
        let mut header = [0u8; CONFIG_DESCRIPTOR_HEADER_LEN];
        let len = self.get_standard_descriptor(endpoint, descriptor_type::CONFIGURATION, index, &mut header)?;

        if len != CONFIG_DESCRIPTOR_HEADER_LEN || header[1] != descriptor_type::CONFIGURATION {
            return Err(UsbError::InvalidDescriptor);
        }

        let total_length = u16::from_le_bytes([header[2], header[3]]) as usize;
        if total_length < CONFIG_DESCRIPTOR_HEADER_LEN {
            return Err(UsbError::InvalidDescriptor);
        }

        let mut data: heapless::Vec<u8, MAX_CONFIG_DESCRIPTOR_LEN> = heapless::Vec::new();
        data.resize(total_length, 0)
            .map_err(|_| UsbError::BufferOverflow)?;

        let len = self.get_standard_descriptor(endpoint, descriptor_type::CONFIGURATION, index, &mut data)?;
        data.truncate(len);

        Ok(data)
    }
}
