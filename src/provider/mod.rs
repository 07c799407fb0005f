//! Provider abstraction layer
//!
//! Capability contracts over the OS display and audio-endpoint subsystems,
//! with one concrete adapter per target platform plus a stub that reports
//! `Unsupported`. The implementation is chosen once at startup and injected
//! into the reconciler; no platform branching leaks past this module.

mod multimon;
mod stub;
mod svcl;
mod tabular;

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::warn;

use crate::device::{AudioDevice, DeviceType, Monitor, Profile};
use crate::error::{Error, Result};

pub use multimon::MultiMonProvider;
pub use stub::{StubAudioProvider, StubMonitorProvider};
pub use svcl::SvclProvider;

/// Env var pointing at a directory containing the helper executables.
pub const TOOLS_DIR_ENV: &str = "DEVPROF_TOOLS_DIR";

// ============================================================================
// Capability Contracts
// ============================================================================

/// Display subsystem capability.
pub trait MonitorProvider: Send {
    /// Query the OS for every known display device, including inactive and
    /// disconnected ones. Devices whose geometry cannot be retrieved still
    /// appear, with zeroed bounds. Ordering is OS-enumeration order.
    fn enumerate(&self) -> Result<Vec<Monitor>>;

    /// Confirm the target's current geometry, then issue an atomic
    /// make-primary change. `RestartRequired` is a soft outcome: the change
    /// took effect but needs a reboot to fully apply.
    fn set_primary(&self, device_handle: &str) -> Result<()>;

    /// Activate or deactivate a display. Deactivation parks the device at a
    /// reserved off-screen position rather than removing it from the
    /// topology (OS-level convention, not a true disable).
    fn set_active(&self, device_handle: &str, active: bool) -> Result<()>;

    /// Apply the monitor portion of a profile in its stored order: active
    /// state first, then primary only once the device is actually active.
    /// Aborts on the first hard failure; already-changed monitors are not
    /// rolled back.
    fn apply_profile(&self, profile: &Profile) -> Result<()> {
        for monitor in &profile.monitors {
            let handle = &monitor.device_handle;
            if monitor.is_active {
                soften(self.set_active(handle, true))
                    .map_err(|e| e.in_step(format!("activate {handle}")))?;
                if monitor.is_primary {
                    soften(self.set_primary(handle))
                        .map_err(|e| e.in_step(format!("set primary {handle}")))?;
                }
            } else {
                soften(self.set_active(handle, false))
                    .map_err(|e| e.in_step(format!("deactivate {handle}")))?;
            }
        }
        Ok(())
    }
}

/// Audio-endpoint subsystem capability.
pub trait AudioProvider: Send {
    /// Query the OS for output and input endpoints. Implementations may
    /// chain several enumeration strategies in a fixed preference order; the
    /// chain stops at the first strategy returning at least one device and
    /// results from different strategies are never merged.
    fn enumerate(&self) -> Result<Vec<AudioDevice>>;

    /// Make the device default for its type, console role only. Clearing any
    /// prior default of the same type is the provider's responsibility.
    fn set_default(&self, id: &str, device_type: DeviceType) -> Result<()>;

    /// Enable or disable the physical endpoint. Platforms lacking this
    /// capability return `Unsupported`, never silent success.
    fn set_enabled(&self, id: &str, enable: bool) -> Result<()>;
}

/// Demote the soft restart-required outcome to a logged warning.
fn soften(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_soft() => {
            warn!("{e}");
            Ok(())
        }
        other => other,
    }
}

// ============================================================================
// Platform Selection
// ============================================================================

/// Build the monitor provider for the current platform.
#[must_use]
pub fn monitor_provider(tools_dir: Option<PathBuf>) -> Box<dyn MonitorProvider> {
    #[cfg(windows)]
    {
        Box::new(MultiMonProvider::new(tools_dir))
    }
    #[cfg(not(windows))]
    {
        let _ = tools_dir;
        Box::new(StubMonitorProvider)
    }
}

/// Build the audio provider for the current platform.
#[must_use]
pub fn audio_provider(tools_dir: Option<PathBuf>) -> Box<dyn AudioProvider> {
    #[cfg(windows)]
    {
        Box::new(SvclProvider::new(tools_dir))
    }
    #[cfg(not(windows))]
    {
        let _ = tools_dir;
        Box::new(StubAudioProvider)
    }
}

// ============================================================================
// Helper-Tool Invocation (shared by the Windows adapters)
// ============================================================================

/// Resolve a helper executable: explicit tools dir, then the env override,
/// then bare name for `PATH` lookup.
fn resolve_tool(tools_dir: Option<&Path>, subdir: &str, exe: &str) -> PathBuf {
    if let Some(dir) = tools_dir {
        return dir.join(subdir).join(exe);
    }
    if let Ok(dir) = std::env::var(TOOLS_DIR_ENV) {
        return PathBuf::from(dir).join(subdir).join(exe);
    }
    PathBuf::from(exe)
}

/// Build a helper-tool command with the console window suppressed.
fn helper_command(tool: &Path) -> Command {
    let cmd = Command::new(tool);
    #[cfg(windows)]
    let cmd = {
        use std::os::windows::process::CommandExt;
        let mut cmd = cmd;
        // CREATE_NO_WINDOW
        cmd.creation_flags(0x0800_0000);
        cmd
    };
    cmd
}

/// Run a helper-tool command to completion, mapping spawn failures and
/// nonzero exits to `Provider` errors carrying the native status.
fn run_helper(mut cmd: Command, what: &str) -> Result<std::process::Output> {
    let output = cmd.output().map_err(|e| Error::Provider {
        message: format!("{what}: failed to run helper: {e}"),
        status: None,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Provider {
            message: format!("{what}: helper exited with failure: {}", stderr.trim()),
            status: output.status.code(),
        });
    }

    Ok(output)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::Bounds;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetActive(String, bool),
        SetPrimary(String),
    }

    /// Recording monitor provider that keeps the trait's own `apply_profile`.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<Call>>,
        fail_on: Option<(Call, fn() -> Error)>,
    }

    impl RecordingProvider {
        fn failing_on(call: Call, error: fn() -> Error) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some((call, error)),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<()> {
            if let Some((trigger, error)) = &self.fail_on {
                if *trigger == call {
                    return Err(error());
                }
            }
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl MonitorProvider for RecordingProvider {
        fn enumerate(&self) -> Result<Vec<Monitor>> {
            Ok(Vec::new())
        }

        fn set_primary(&self, device_handle: &str) -> Result<()> {
            self.record(Call::SetPrimary(device_handle.to_string()))
        }

        fn set_active(&self, device_handle: &str, active: bool) -> Result<()> {
            self.record(Call::SetActive(device_handle.to_string(), active))
        }
    }

    fn make_monitor(handle: &str, primary: bool, active: bool) -> Monitor {
        Monitor {
            device_handle: handle.to_string(),
            display_name: format!("Monitor {handle}"),
            is_primary: primary,
            is_active: active,
            is_enabled: true,
            bounds: Bounds::default(),
            nickname: None,
        }
    }

    fn layout() -> Profile {
        Profile {
            name: "desk".to_string(),
            monitors: vec![
                make_monitor("m2", false, true),
                make_monitor("m1", true, true),
                make_monitor("m3", false, false),
            ],
            audio_devices: Vec::new(),
        }
    }

    #[test]
    fn apply_profile_replays_stored_order_activating_before_primary() {
        let provider = RecordingProvider::default();

        provider.apply_profile(&layout()).unwrap();

        assert_eq!(
            provider.calls(),
            vec![
                Call::SetActive("m2".to_string(), true),
                Call::SetActive("m1".to_string(), true),
                Call::SetPrimary("m1".to_string()),
                Call::SetActive("m3".to_string(), false),
            ]
        );
    }

    #[test]
    fn apply_profile_aborts_on_first_hard_failure_naming_the_step() {
        let provider = RecordingProvider::failing_on(
            Call::SetActive("m1".to_string(), true),
            || Error::BadMode,
        );

        let err = provider.apply_profile(&layout()).unwrap_err();

        match err {
            Error::ApplyStep { step, source } => {
                assert_eq!(step, "activate m1");
                assert!(matches!(*source, Error::BadMode));
            }
            other => panic!("expected ApplyStep, got {other:?}"),
        }
        // m1's primary change and m3's deactivation never happen
        assert_eq!(provider.calls(), vec![Call::SetActive("m2".to_string(), true)]);
    }

    #[test]
    fn apply_profile_treats_restart_required_as_success() {
        let provider = RecordingProvider::failing_on(Call::SetPrimary("m1".to_string()), || {
            Error::RestartRequired
        });

        provider.apply_profile(&layout()).unwrap();

        // The soft outcome is logged, not recorded, and the replay continues
        assert_eq!(
            provider.calls(),
            vec![
                Call::SetActive("m2".to_string(), true),
                Call::SetActive("m1".to_string(), true),
                Call::SetActive("m3".to_string(), false),
            ]
        );
    }
}
