//! Stub providers for platforms without a working adapter
//!
//! Every call fails with an explicit `Unsupported` error rather than
//! returning empty success, so callers can tell a platform gap from a
//! machine with no devices.

use super::{AudioProvider, MonitorProvider};
use crate::device::{AudioDevice, DeviceType, Monitor, Profile};
use crate::error::{Error, Result};

pub struct StubMonitorProvider;

impl MonitorProvider for StubMonitorProvider {
    fn enumerate(&self) -> Result<Vec<Monitor>> {
        Err(Error::Unsupported("monitor enumeration"))
    }

    fn set_primary(&self, _device_handle: &str) -> Result<()> {
        Err(Error::Unsupported("setting the primary monitor"))
    }

    fn set_active(&self, _device_handle: &str, _active: bool) -> Result<()> {
        Err(Error::Unsupported("changing monitor active state"))
    }

    fn apply_profile(&self, _profile: &Profile) -> Result<()> {
        Err(Error::Unsupported("applying monitor profiles"))
    }
}

pub struct StubAudioProvider;

impl AudioProvider for StubAudioProvider {
    fn enumerate(&self) -> Result<Vec<AudioDevice>> {
        Err(Error::Unsupported("audio device enumeration"))
    }

    fn set_default(&self, _id: &str, _device_type: DeviceType) -> Result<()> {
        Err(Error::Unsupported("setting the default audio device"))
    }

    fn set_enabled(&self, _id: &str, _enable: bool) -> Result<()> {
        Err(Error::Unsupported("enabling/disabling audio devices"))
    }
}
