//! Deferred device removal
//!
//! A device that refuses an immediate shutdown is parked in the event queue
//! with the tick count of the removal request. Each plug-and-play pass polls
//! it once:
//!
//! ```text
//! Pending --(grace period elapsed)--> Forced   (dropped, no further shutdown)
//! Pending --(shutdown succeeds)-----> ShutDown (dropped)
//! Pending --(shutdown refused)------> Pending  (stays queued)
//! ```
//!
//! There is no way to cancel a pending removal.

use crate::device::UsbDevice;
use alloc::boxed::Box;
use core::fmt;

/// Grace period before a refusing device is dropped anyway
pub const DEVICE_REMOVAL_GRACE_MS: u32 = 150;

/// Result of polling a pending removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemovalOutcome {
    /// Shutdown refused, deadline not reached
    Pending,
    /// Shutdown succeeded; the device may be freed
    ShutDown,
    /// Deadline reached; the device is freed regardless of its state
    Forced,
}

impl RemovalOutcome {
    /// True once the device has been released
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A device whose removal has been requested but not yet completed
pub struct PendingRemoval {
    device: Box<dyn UsbDevice + Send>,
    requested_at: u32,
}

impl PendingRemoval {
    pub(crate) fn new(device: Box<dyn UsbDevice + Send>, requested_at: u32) -> Self {
        Self {
            device,
            requested_at,
        }
    }

    /// Tick count when removal was first requested
    pub fn requested_at(&self) -> u32 {
        self.requested_at
    }

    /// Address of the device being removed
    pub fn device_address(&self) -> u8 {
        self.device.address()
    }

    /// Advance the state machine at tick `now`
    ///
    /// The deadline is checked first: once it has passed the device is not
    /// asked to shut down again.
    pub fn poll(&mut self, now: u32, grace_ticks: u32) -> RemovalOutcome {
        if now.wrapping_sub(self.requested_at) >= grace_ticks {
            RemovalOutcome::Forced
        } else if self.device.shutdown() {
            RemovalOutcome::ShutDown
        } else {
            RemovalOutcome::Pending
        }
    }
}

impl fmt::Debug for PendingRemoval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRemoval")
            .field("device_address", &self.device_address())
            .field("requested_at", &self.requested_at)
            .finish()
    }
}
