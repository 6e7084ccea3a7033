//! Controller-independent host core
//!
//! [`HostCore`] owns the plug-and-play event queue. Interrupt or poll
//! context reports topology changes through [`HostCore::port_status_changed`],
//! [`HostCore::hub_status_changed`] and [`HostCore::remove_device`]; an
//! external scheduler calls [`HostCore::update_plug_and_play`] at a regular
//! cadence to handle them.
//!
//! # Example
//!
//! ```no_run
//! use usbh_core::{HostConfig, HostCore, HubId, RootPortId, Timer, Topology};
//!
//! struct Ports;
//!
//! impl Topology for Ports {
//!     fn handle_root_port_change(&mut self, _host: &HostCore<'_>, _port: RootPortId) {
//!         // re-read PORTSC, enumerate or detach
//!     }
//!     fn handle_hub_change(&mut self, _host: &HostCore<'_>, _hub: HubId) {}
//! }
//!
//! # fn example(timer: &dyn Timer) {
//! let host = HostCore::new(HostConfig::default(), timer);
//! let mut ports = Ports;
//!
//! // From the port change interrupt:
//! host.port_status_changed(RootPortId(0));
//!
//! // From the main loop, e.g. every 10 ms:
//! while host.update_plug_and_play(&mut ports) {}
//! # }
//! ```

use crate::device::UsbDevice;
use crate::perf::{PnpCounters, PnpStats};
use crate::timer::Timer;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

pub mod events;
pub mod removal;

pub use events::{Event, HubId, PendingEvent, RootPortId, Topology};
pub use removal::{PendingRemoval, RemovalOutcome, DEVICE_REMOVAL_GRACE_MS};

use events::EventQueue;

/// Registered host instance for [`HostCore::get`]
static INSTANCE: AtomicPtr<HostCore<'static>> = AtomicPtr::new(ptr::null_mut());

/// Host core configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostConfig {
    /// Detect and report topology changes at run time. When disabled the
    /// topology is fixed at startup and removed devices are dropped at once.
    pub plug_and_play: bool,
    /// Grace period before a device refusing shutdown is dropped anyway
    pub removal_grace_ms: u32,
    /// Events preallocated in the queue so producers rarely allocate
    pub event_queue_capacity: usize,
}

impl HostConfig {
    /// Plug-and-play on, 150 ms removal grace, 16 preallocated events
    pub const fn new() -> Self {
        Self {
            plug_and_play: true,
            removal_grace_ms: DEVICE_REMOVAL_GRACE_MS,
            event_queue_capacity: 16,
        }
    }

    /// Fixed topology: no event queue processing
    pub const fn static_topology() -> Self {
        Self {
            plug_and_play: false,
            ..Self::new()
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Host controller core: event queue, removal policy and instance registry
pub struct HostCore<'t> {
    timer: &'t dyn Timer,
    plug_and_play: bool,
    removal_grace_ticks: u32,
    first_update_call: AtomicBool,
    queue: EventQueue,
    counters: PnpCounters,
}

impl<'t> HostCore<'t> {
    /// Create a host core reading time from `timer`
    pub fn new(config: HostConfig, timer: &'t dyn Timer) -> Self {
        #[cfg(feature = "defmt")]
        defmt::info!(
            "USB host core: plug-and-play={}, removal grace {} ms",
            config.plug_and_play,
            config.removal_grace_ms
        );

        Self {
            timer,
            plug_and_play: config.plug_and_play,
            removal_grace_ticks: timer.ms_to_ticks(config.removal_grace_ms),
            first_update_call: AtomicBool::new(true),
            queue: EventQueue::with_capacity(config.event_queue_capacity),
            counters: PnpCounters::new(),
        }
    }

    /// Whether topology changes are processed at run time
    pub fn is_plug_and_play(&self) -> bool {
        self.plug_and_play
    }

    /// Grace period for deferred removals, in timer ticks
    pub fn removal_grace_ticks(&self) -> u32 {
        self.removal_grace_ticks
    }

    /// Report a status change on a root port
    ///
    /// Safe from interrupt context. Panics if plug-and-play is disabled.
    pub fn port_status_changed(&self, port: RootPortId) {
        self.assert_plug_and_play();

        #[cfg(feature = "defmt")]
        defmt::trace!("Root port {} changed", port.0);

        self.enqueue(Event::RootPortChanged(port));
    }

    /// Report a status change on a hub
    ///
    /// Safe from interrupt context. Panics if plug-and-play is disabled.
    pub fn hub_status_changed(&self, hub: HubId) {
        self.assert_plug_and_play();

        #[cfg(feature = "defmt")]
        defmt::trace!("Hub {} changed", hub.0);

        self.enqueue(Event::HubChanged(hub));
    }

    /// Remove a device, now if possible, otherwise on a later pass
    ///
    /// With plug-and-play disabled the device is dropped without a shutdown
    /// attempt. Otherwise it is dropped here if it shuts down at once, or
    /// queued with the current tick count for deferred removal.
    pub fn remove_device(&self, mut device: Box<dyn UsbDevice + Send>) {
        if !self.plug_and_play || device.shutdown() {
            #[cfg(feature = "defmt")]
            defmt::info!("Device {} removed", device.address());

            PnpCounters::bump(&self.counters.immediate_removals);
            drop(device);
            return;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Device {} busy, deferring removal", device.address());

        let pending = PendingRemoval::new(device, self.timer.ticks());
        self.enqueue(Event::DeviceRemoved(pending));
    }

    /// Handle queued events; returns true if anything changed
    ///
    /// The first call on a new instance always returns true so that a caller
    /// looping until the initial enumeration settles makes progress even with
    /// an empty queue. Must only be called from one context at a time.
    ///
    /// Events queued by the handlers themselves are left for the next call.
    pub fn update_plug_and_play<T: Topology + ?Sized>(&self, topology: &mut T) -> bool {
        self.assert_plug_and_play();

        let mut changed = self.first_update_call.swap(false, Ordering::AcqRel);

        let mut batch = self.queue.take_all();

        // Retained events go to the back of the same buffer, so after one
        // rotation it holds exactly the unresolved events in arrival order.
        for _ in 0..batch.len() {
            let Some(event) = batch.pop_front() else {
                break;
            };

            match self.dispatch(event, topology) {
                Some(unresolved) => batch.push_back(unresolved),
                None => {
                    PnpCounters::bump(&self.counters.events_handled);
                    changed = true;
                }
            }
        }

        self.queue.restore(batch);
        PnpCounters::bump(&self.counters.update_passes);

        changed
    }

    /// Handle one event with no lock held; unresolved events are returned
    fn dispatch<T: Topology + ?Sized>(&self, event: Event, topology: &mut T) -> Option<Event> {
        match event {
            Event::RootPortChanged(port) => {
                topology.handle_root_port_change(self, port);
                None
            }
            Event::HubChanged(hub) => {
                topology.handle_hub_change(self, hub);
                None
            }
            Event::DeviceRemoved(mut pending) => {
                let outcome = pending.poll(self.timer.ticks(), self.removal_grace_ticks);
                if !outcome.is_handled() {
                    return Some(Event::DeviceRemoved(pending));
                }

                if outcome == RemovalOutcome::Forced {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "Device {} did not shut down within {} ticks, dropping",
                        pending.device_address(),
                        self.removal_grace_ticks
                    );

                    PnpCounters::bump(&self.counters.forced_removals);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::info!("Device {} removed", pending.device_address());

                    PnpCounters::bump(&self.counters.deferred_removals);
                }
                None
            }
        }
    }

    fn enqueue(&self, event: Event) {
        self.queue.push_back(event);
        PnpCounters::bump(&self.counters.events_queued);
    }

    #[inline]
    fn assert_plug_and_play(&self) {
        assert!(self.plug_and_play, "USB host: plug-and-play operation while plug-and-play is disabled");
    }

    /// Number of events waiting for the next pass
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// True while any event, including an unresolved removal, is queued
    pub fn has_pending_events(&self) -> bool {
        self.pending_count() != 0
    }

    /// Snapshot of the queue, head first. Not for interrupt context.
    pub fn pending_events(&self) -> Vec<PendingEvent> {
        self.queue.snapshot()
    }

    /// Live activity counters
    pub fn counters(&self) -> &PnpCounters {
        &self.counters
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> PnpStats {
        self.counters.snapshot()
    }
}

impl HostCore<'static> {
    /// Make this instance reachable through [`HostCore::get`]
    ///
    /// At most one instance may be registered. Registering another replaces
    /// the previous one without touching it.
    pub fn register(&'static self) {
        let this = self as *const Self as *mut Self;
        let _previous = INSTANCE.swap(this, Ordering::AcqRel);

        #[cfg(feature = "defmt")]
        if !_previous.is_null() && _previous != this {
            defmt::warn!("USB host instance replaced");
        }
    }

    /// Clear the registered instance if it is this one
    pub fn unregister(&'static self) {
        let this = self as *const Self as *mut Self;
        let _ = INSTANCE.compare_exchange(this, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire);
    }

    /// The registered instance
    ///
    /// Panics if no instance is registered.
    pub fn get() -> &'static HostCore<'static> {
        match Self::try_get() {
            Some(host) => host,
            None => panic!("USB host: no host controller instance registered"),
        }
    }

    /// The registered instance, if any
    pub fn try_get() -> Option<&'static HostCore<'static>> {
        let ptr = INSTANCE.load(Ordering::Acquire);
        // SAFETY: only `register` stores non-null values, and it requires a
        // `'static` borrow, so the pointee lives for the rest of the program.
        unsafe { ptr.as_ref() }
    }
}

impl Drop for HostCore<'_> {
    fn drop(&mut self) {
        let this = self as *mut Self as *mut HostCore<'static>;
        let _ = INSTANCE.compare_exchange(this, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire);

        #[cfg(feature = "defmt")]
        if self.queue.len() != 0 {
            defmt::debug!("USB host dropped with {} pending events", self.queue.len());
        }
    }
}
