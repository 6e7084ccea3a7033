//! Topology events and the interrupt-safe queue that holds them

use super::removal::PendingRemoval;
use super::HostCore;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::RefCell;
use critical_section::Mutex;

/// Handle of a root port, owned by the topology code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RootPortId(pub u8);

/// Handle of an external hub, owned by the topology code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HubId(pub u8);

/// Pending topology change
///
/// Port and hub variants are back-references only. A device removal owns
/// its device until the removal is handled.
#[derive(Debug)]
pub enum Event {
    /// Status change on a root port
    RootPortChanged(RootPortId),
    /// Status change on a hub's downstream port
    HubChanged(HubId),
    /// Device waiting for a successful shutdown or the grace deadline
    DeviceRemoved(PendingRemoval),
}

impl Event {
    /// Copyable description of this event
    pub fn summary(&self) -> PendingEvent {
        match self {
            Self::RootPortChanged(port) => PendingEvent::RootPort(*port),
            Self::HubChanged(hub) => PendingEvent::Hub(*hub),
            Self::DeviceRemoved(pending) => PendingEvent::DeviceRemoval {
                address: pending.device_address(),
                requested_at: pending.requested_at(),
            },
        }
    }
}

/// Snapshot of a queued event, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingEvent {
    /// Root port status change
    RootPort(RootPortId),
    /// Hub status change
    Hub(HubId),
    /// Device removal waiting for shutdown or its deadline
    DeviceRemoval {
        /// Address reported by the device
        address: u8,
        /// Tick count when removal was first requested
        requested_at: u32,
    },
}

/// Handlers for port status changes, supplied by the root-port/hub code
///
/// Handlers run outside the queue's critical section and receive the host
/// so they can report further changes or remove devices while handling.
/// A handle the implementation does not know is an integration defect and
/// should panic.
pub trait Topology {
    /// Re-read and act on the status of a root port
    fn handle_root_port_change(&mut self, host: &HostCore<'_>, port: RootPortId);

    /// Re-read and act on the port status of a hub
    fn handle_hub_change(&mut self, host: &HostCore<'_>, hub: HubId);
}

/// FIFO of pending events guarded by a critical section
///
/// The critical section covers only queue manipulation. Handlers are never
/// called with it held, so producers that run from a handler cannot
/// deadlock against the consumer.
pub(crate) struct EventQueue {
    events: Mutex<RefCell<VecDeque<Event>>>,
    capacity: usize,
}

impl EventQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(RefCell::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append at the tail. Safe from interrupt context.
    pub(crate) fn push_back(&self, event: Event) {
        critical_section::with(|cs| {
            self.events.borrow_ref_mut(cs).push_back(event);
        });
    }

    /// Move every queued event into a local batch, leaving the queue empty
    ///
    /// The queue keeps its preallocated capacity while the batch is out, so
    /// producers running during the pass do not allocate either. The
    /// replacement buffer is allocated before entering the critical section.
    pub(crate) fn take_all(&self) -> VecDeque<Event> {
        let fresh = VecDeque::with_capacity(self.capacity);
        critical_section::with(|cs| core::mem::replace(&mut *self.events.borrow_ref_mut(cs), fresh))
    }

    /// Put unresolved events back ahead of anything queued since
    /// [`EventQueue::take_all`], preserving arrival order
    pub(crate) fn restore(&self, mut retained: VecDeque<Event>) {
        let spare = critical_section::with(|cs| {
            let mut events = self.events.borrow_ref_mut(cs);
            retained.append(&mut events);
            core::mem::replace(&mut *events, retained)
        });

        // Free the emptied buffer outside the critical section
        drop(spare);
    }

    pub(crate) fn len(&self) -> usize {
        critical_section::with(|cs| self.events.borrow_ref(cs).len())
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        critical_section::with(|cs| self.events.borrow_ref(cs).capacity())
    }

    pub(crate) fn snapshot(&self) -> Vec<PendingEvent> {
        critical_section::with(|cs| {
            self.events
                .borrow_ref(cs)
                .iter()
                .map(Event::summary)
                .collect()
        })
    }
}
