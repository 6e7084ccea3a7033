//! Shared test utilities for usbh-core tests

pub mod mock_hardware;

#[allow(unused_imports)]
pub use mock_hardware::{
    test_config_descriptor, test_device_descriptor, Handled, MockDevice, MockTimer, RecordingTopology,
    Reply, ScriptedController,
};
