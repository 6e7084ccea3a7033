//! Device objects as seen by the host core

/// A device the host core may have to tear down
///
/// Destroying the device is dropping it: the host core drops the boxed
/// device exactly once, either inside [`crate::HostCore::remove_device`] or
/// from a later plug-and-play pass.
pub trait UsbDevice {
    /// Attempt a graceful shutdown of the device and its class driver
    ///
    /// Returns `true` when the device can be freed immediately. Returning
    /// `false` defers removal; the host retries on each plug-and-play pass
    /// until it succeeds or the removal grace period expires.
    fn shutdown(&mut self) -> bool;

    /// Device address, for diagnostics
    fn address(&self) -> u8 {
        0
    }
}
