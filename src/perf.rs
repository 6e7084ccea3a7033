//! Plug-and-play activity counters
//!
//! Relaxed atomics only: the counters are diagnostics, never used for
//! synchronization.

use core::sync::atomic::{AtomicU32, Ordering};

/// Counters for the host's event queue
pub struct PnpCounters {
    /// Events appended to the queue
    pub events_queued: AtomicU32,

    /// Events handled and removed from the queue
    pub events_handled: AtomicU32,

    /// Devices dropped synchronously inside `remove_device`
    pub immediate_removals: AtomicU32,

    /// Devices dropped after a successful deferred shutdown
    pub deferred_removals: AtomicU32,

    /// Devices dropped because the removal grace period expired
    pub forced_removals: AtomicU32,

    /// Completed plug-and-play passes
    pub update_passes: AtomicU32,
}

impl PnpCounters {
    /// Create new counter set
    pub const fn new() -> Self {
        Self {
            events_queued: AtomicU32::new(0),
            events_handled: AtomicU32::new(0),
            immediate_removals: AtomicU32::new(0),
            deferred_removals: AtomicU32::new(0),
            forced_removals: AtomicU32::new(0),
            update_passes: AtomicU32::new(0),
        }
    }

    #[inline(always)]
    pub(crate) fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of all counters
    pub fn snapshot(&self) -> PnpStats {
        PnpStats {
            events_queued: self.events_queued.load(Ordering::Relaxed),
            events_handled: self.events_handled.load(Ordering::Relaxed),
            immediate_removals: self.immediate_removals.load(Ordering::Relaxed),
            deferred_removals: self.deferred_removals.load(Ordering::Relaxed),
            forced_removals: self.forced_removals.load(Ordering::Relaxed),
            update_passes: self.update_passes.load(Ordering::Relaxed),
        }
    }
}

impl Default for PnpCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`PnpCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub struct PnpStats {
    pub events_queued: u32,
    pub events_handled: u32,
    pub immediate_removals: u32,
    pub deferred_removals: u32,
    pub forced_removals: u32,
    pub update_passes: u32,
}

impl PnpStats {
    /// Events still waiting in the queue when the snapshot was taken
    pub fn backlog(&self) -> u32 {
        self.events_queued.saturating_sub(self.events_handled)
    }
}
