#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

//! Controller-independent USB host core
//!
//! This crate sits between a concrete host controller driver (EHCI, DWC2,
//! ...) and the topology and class-driver code above it. It provides:
//!
//! - [`host`] - plug-and-play event queue, deferred device removal and the
//!   registered host instance
//! - [`transfer`] - setup packets and the blocking control-transfer protocol
//!   on top of a controller's [`BlockingSubmit`] primitive
//! - [`timer`] - the tick source and delay contract the core relies on
//! - [`error`] - error types
//!
//! # Contexts
//!
//! Topology notifications ([`HostCore::port_status_changed`],
//! [`HostCore::hub_status_changed`], [`HostCore::remove_device`]) may be
//! raised from interrupt context. [`HostCore::update_plug_and_play`] and all
//! control transfers run from thread or poll context only.

extern crate alloc;

#[cfg(feature = "defmt")]
use defmt as _;

pub mod device;
pub mod error;
pub mod host;
pub mod perf;
pub mod timer;
pub mod transfer;


pub use device::UsbDevice;
pub use error::{Result, UsbError};
pub use host::{
    HostConfig, HostCore, HubId, PendingEvent, RemovalOutcome, RootPortId, Topology,
    DEVICE_REMOVAL_GRACE_MS,
};
pub use timer::Timer;
pub use transfer::control::SETTLE_DELAY_MS;
pub use transfer::{
    BlockingSubmit, ControlExecutor, Direction, Endpoint, RequestType, SetupPacket, TransferType,
    UsbRequest,
};
