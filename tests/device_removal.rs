//! Device removal tests
//!
//! Immediate removal, deferred removal and the forced-removal deadline.

mod common;

use common::{MockDevice, MockTimer, RecordingTopology};
use usbh_core::{HostConfig, HostCore, PendingEvent, DEVICE_REMOVAL_GRACE_MS};

#[test]
fn test_cooperative_device_removed_synchronously() {
    let timer = MockTimer::new();
    let host = HostCore::new(HostConfig::default(), &timer);
    let (device, probe) = MockDevice::cooperative(3);

    host.remove_device(device);

    assert!(probe.is_dropped());
    assert_eq!(probe.attempts(), 1);
    assert!(!host.has_pending_events());
    assert_eq!(host.stats().immediate_removals, 1);
}

#[test]
fn test_static_topology_drops_without_shutdown() {
    let timer = MockTimer::new();
    let host = HostCore::new(HostConfig::static_topology(), &timer);
    let (device, probe) = MockDevice::stubborn(3);

    host.remove_device(device);

    assert!(probe.is_dropped());
    assert_eq!(probe.attempts(), 0);
    assert_eq!(host.pending_count(), 0);
}

#[test]
fn test_refusing_device_forced_at_deadline() {
    let timer = MockTimer::starting_at(1_000);
    let host = HostCore::new(HostConfig::default(), &timer);
    let mut topology = RecordingTopology::default();
    let (device, probe) = MockDevice::stubborn(7);

    host.update_plug_and_play(&mut topology);
    host.remove_device(device);
    assert_eq!(
        host.pending_events(),
        [PendingEvent::DeviceRemoval { address: 7, requested_at: 1_000 }]
    );

    // Polls before the deadline retry shutdown and keep the device
    for elapsed in [0, 10, 100, 149] {
        timer.set(1_000 + elapsed);
        assert!(!host.update_plug_and_play(&mut topology));
        assert!(!probe.is_dropped(), "dropped early at +{} ticks", elapsed);
    }
    let attempts_before_deadline = probe.attempts();
    assert_eq!(attempts_before_deadline, 5);

    timer.set(1_000 + DEVICE_REMOVAL_GRACE_MS);
    assert!(host.update_plug_and_play(&mut topology));
    assert!(probe.is_dropped());
    assert!(!host.has_pending_events());

    // Forced removal does not ask the device again
    assert_eq!(probe.attempts(), attempts_before_deadline);
    assert_eq!(host.stats().forced_removals, 1);
}

#[test]
fn test_late_poll_still_forces_removal() {
    let timer = MockTimer::new();
    let host = HostCore::new(HostConfig::default(), &timer);
    let mut topology = RecordingTopology::default();
    let (device, probe) = MockDevice::stubborn(1);

    host.remove_device(device);
    timer.advance(10_000);

    assert!(host.update_plug_and_play(&mut topology));
    assert!(probe.is_dropped());
}

#[test]
fn test_deferred_shutdown_success_removes_device() {
    let timer = MockTimer::new();
    let host = HostCore::new(HostConfig::default(), &timer);
    let mut topology = RecordingTopology::default();
    let (device, probe) = MockDevice::stubborn(2);

    host.update_plug_and_play(&mut topology);
    host.remove_device(device);

    timer.advance(20);
    assert!(!host.update_plug_and_play(&mut topology));

    probe.allow_shutdown();
    timer.advance(20);
    assert!(host.update_plug_and_play(&mut topology));
    assert!(probe.is_dropped());

    let stats = host.stats();
    assert_eq!(stats.deferred_removals, 1);
    assert_eq!(stats.forced_removals, 0);
}

#[test]
fn test_custom_grace_period() {
    let timer = MockTimer::new();
    let config = HostConfig {
        removal_grace_ms: 20,
        ..HostConfig::default()
    };
    let host = HostCore::new(config, &timer);
    let mut topology = RecordingTopology::default();
    let (device, probe) = MockDevice::stubborn(4);

    host.remove_device(device);
    timer.set(19);
    host.update_plug_and_play(&mut topology);
    assert!(!probe.is_dropped());

    timer.set(20);
    host.update_plug_and_play(&mut topology);
    assert!(probe.is_dropped());
}

#[test]
fn test_pending_removals_released_with_host() {
    let timer = MockTimer::new();
    let (device, probe) = MockDevice::stubborn(6);
    {
        let host = HostCore::new(HostConfig::default(), &timer);
        host.remove_device(device);
        assert!(!probe.is_dropped());
    }
    assert!(probe.is_dropped());
}
