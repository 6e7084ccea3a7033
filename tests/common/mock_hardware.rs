//! Mock hardware helpers for testing without a real controller
//!
//! Provides a manually driven timer, devices with scripted shutdown
//! behaviour, a scripted blocking-submission controller and a topology that
//! records what it was asked to handle.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use usbh_core::{
    BlockingSubmit, Direction, HostCore, HubId, RootPortId, SetupPacket, Timer, Topology,
    UsbDevice, UsbError, UsbRequest,
};

/// 1 kHz timer that only moves when told to (or when delayed on)
#[derive(Default)]
pub struct MockTimer {
    ticks: AtomicU32,
    delays: Mutex<Vec<u32>>,
}

impl MockTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ticks: u32) -> Self {
        let timer = Self::default();
        timer.set(ticks);
        timer
    }

    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    pub fn set(&self, ticks: u32) {
        self.ticks.store(ticks, Ordering::Relaxed);
    }

    /// Every `ms_delay` argument, in call order
    pub fn delays(&self) -> Vec<u32> {
        self.delays.lock().unwrap().clone()
    }
}

impl Timer for MockTimer {
    fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn ms_delay(&self, ms: u32) {
        self.delays.lock().unwrap().push(ms);
        self.advance(ms);
    }
}

/// Shared view of a [`MockDevice`] that outlives the device itself
#[derive(Default)]
pub struct DeviceProbe {
    pub shutdown_attempts: AtomicU32,
    pub accept_shutdown: AtomicBool,
    pub dropped: AtomicBool,
}

impl DeviceProbe {
    pub fn attempts(&self) -> u32 {
        self.shutdown_attempts.load(Ordering::Relaxed)
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn allow_shutdown(&self) {
        self.accept_shutdown.store(true, Ordering::Relaxed);
    }
}

/// Device whose shutdown answer is controlled through its probe
pub struct MockDevice {
    address: u8,
    probe: Arc<DeviceProbe>,
}

impl MockDevice {
    /// Device that shuts down on the first request
    pub fn cooperative(address: u8) -> (Box<Self>, Arc<DeviceProbe>) {
        let (device, probe) = Self::stubborn(address);
        probe.allow_shutdown();
        (device, probe)
    }

    /// Device that refuses shutdown until `DeviceProbe::allow_shutdown`
    pub fn stubborn(address: u8) -> (Box<Self>, Arc<DeviceProbe>) {
        let probe = Arc::new(DeviceProbe::default());
        let device = Box::new(Self {
            address,
            probe: probe.clone(),
        });
        (device, probe)
    }
}

impl UsbDevice for MockDevice {
    fn shutdown(&mut self) -> bool {
        self.probe.shutdown_attempts.fetch_add(1, Ordering::Relaxed);
        self.probe.accept_shutdown.load(Ordering::Relaxed)
    }

    fn address(&self) -> u8 {
        self.address
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        assert!(
            !self.probe.dropped.swap(true, Ordering::Relaxed),
            "device {} dropped twice",
            self.address
        );
    }
}

/// What the scripted controller saw for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub device_address: u8,
    pub endpoint: u8,
    pub setup: Option<SetupPacket>,
    pub setup_bytes: Option<[u8; 8]>,
    pub direction: Direction,
    pub buffer_len: usize,
    pub out_data: Vec<u8>,
    pub timeout_ms: Option<u32>,
    pub submitted_at: u32,
}

/// Scripted reply for the next submission
#[derive(Debug, Clone)]
pub enum Reply {
    /// Complete, copying these bytes into IN buffers
    Data(Vec<u8>),
    /// Complete, reporting this many bytes moved
    Length(usize),
    /// Fail with this error
    Fail(UsbError),
}

/// Blocking controller that answers from a script
pub struct ScriptedController<'t> {
    timer: &'t MockTimer,
    replies: VecDeque<Reply>,
    pub submissions: Vec<Submission>,
}

impl<'t> ScriptedController<'t> {
    pub fn new(timer: &'t MockTimer) -> Self {
        Self {
            timer,
            replies: VecDeque::new(),
            submissions: Vec::new(),
        }
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }
}

impl BlockingSubmit for ScriptedController<'_> {
    fn submit_blocking_request(
        &mut self,
        request: &mut UsbRequest<'_>,
        timeout_ms: Option<u32>,
    ) -> usbh_core::Result<()> {
        let setup = request.setup().copied();
        let direction = request.direction();
        self.submissions.push(Submission {
            device_address: request.endpoint().device_address,
            endpoint: request.endpoint().number,
            setup,
            setup_bytes: setup.map(|s| s.to_bytes()),
            direction,
            buffer_len: request.buffer().len(),
            out_data: match direction {
                Direction::Out => request.buffer().to_vec(),
                Direction::In => Vec::new(),
            },
            timeout_ms,
            submitted_at: self.timer.ticks(),
        });

        match self.replies.pop_front().unwrap_or(Reply::Length(0)) {
            Reply::Data(bytes) => {
                let buf = request.buffer_mut();
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                request.set_result_length(n);
                Ok(())
            }
            Reply::Length(n) => {
                request.set_result_length(n);
                Ok(())
            }
            Reply::Fail(e) => Err(e),
        }
    }
}

/// Something the topology was asked to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    RootPort(u8),
    Hub(u8),
}

/// Topology that records handler calls and optionally reacts to them
#[derive(Default)]
pub struct RecordingTopology {
    pub handled: Vec<Handled>,
    /// Root port handlers report a change on this hub, once each
    pub cascade_to_hub: Option<u8>,
    /// Root port handlers re-report their own port this many times in total
    pub rereport_budget: u32,
    /// Devices the root port handler removes
    pub detach: Vec<Box<dyn UsbDevice + Send>>,
}

impl Topology for RecordingTopology {
    fn handle_root_port_change(&mut self, host: &HostCore<'_>, port: RootPortId) {
        self.handled.push(Handled::RootPort(port.0));

        if let Some(hub) = self.cascade_to_hub.take() {
            host.hub_status_changed(HubId(hub));
        }
        if self.rereport_budget > 0 {
            self.rereport_budget -= 1;
            host.port_status_changed(port);
        }
        for device in self.detach.drain(..) {
            host.remove_device(device);
        }
    }

    fn handle_hub_change(&mut self, _host: &HostCore<'_>, hub: HubId) {
        self.handled.push(Handled::Hub(hub.0));
    }
}

/// Standard USB 2.0 device descriptor
pub fn test_device_descriptor() -> [u8; 18] {
    [
        0x12,       // bLength
        0x01,       // bDescriptorType (DEVICE)
        0x00, 0x02, // bcdUSB (2.0)
        0x00,       // bDeviceClass (defined at interface level)
        0x00,       // bDeviceSubClass
        0x00,       // bDeviceProtocol
        0x40,       // bMaxPacketSize0 (64 bytes)
        0x83, 0x04, // idVendor (0x0483)
        0x40, 0x00, // idProduct (0x0040)
        0x00, 0x01, // bcdDevice (1.0)
        0x01,       // iManufacturer
        0x02,       // iProduct
        0x03,       // iSerialNumber
        0x01,       // bNumConfigurations
    ]
}

/// Configuration with one interface and one bulk IN endpoint
pub fn test_config_descriptor() -> Vec<u8> {
    vec![
        0x09, 0x02, 0x19, 0x00, 0x01, 0x01, 0x00, 0x80, 0x32, // configuration
        0x09, 0x04, 0x00, 0x00, 0x01, 0x08, 0x06, 0x50, 0x00, // interface
        0x07, 0x05, 0x81, 0x02, 0x00, 0x02, 0x00, // endpoint 0x81 bulk 512
    ]
}
