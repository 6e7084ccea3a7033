//! USB error types

use core::fmt;

/// USB operation result type
pub type Result<T> = core::result::Result<T, UsbError>;

/// Recoverable errors reported by the host core
///
/// Integration defects (plug-and-play calls while disabled, missing
/// controller instance, unknown topology handles) are not represented
/// here: they panic at the point of detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbError {
    /// Device not found or disconnected
    DeviceDisconnected,
    /// USB stall condition
    Stall,
    /// Timeout waiting for response
    Timeout,
    /// Babble detected (device sent too much data)
    Babble,
    /// Transaction error (CRC, timeout, bad PID)
    TransactionError,
    /// Data buffer overrun or underrun in the controller
    DataBufferError,
    /// Host system error (DMA error)
    HostSystemError,
    /// Device NAK'd transaction
    Nak,
    /// Buffer too large for the request
    BufferOverflow,
    /// Invalid parameter
    InvalidParameter,
    /// Invalid descriptor
    InvalidDescriptor,
}

impl UsbError {
    /// True for errors reported by the submission primitive, as opposed to
    /// errors caught before anything was submitted
    pub fn is_submission_failure(&self) -> bool {
        !matches!(
            self,
            Self::BufferOverflow | Self::InvalidParameter | Self::InvalidDescriptor
        )
    }
}

impl fmt::Display for UsbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceDisconnected => write!(f, "Device disconnected"),
            Self::Stall => write!(f, "USB stall"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Babble => write!(f, "Babble detected"),
            Self::TransactionError => write!(f, "Transaction error"),
            Self::DataBufferError => write!(f, "Data buffer error"),
            Self::HostSystemError => write!(f, "Host system error"),
            Self::Nak => write!(f, "Device NAK"),
            Self::BufferOverflow => write!(f, "Buffer overflow"),
            Self::InvalidParameter => write!(f, "Invalid parameter"),
            Self::InvalidDescriptor => write!(f, "Invalid descriptor"),
        }
    }
}
