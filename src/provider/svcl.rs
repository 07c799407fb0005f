//! Audio adapter driving a SoundVolumeView-style helper (`svcl`)
//!
//! The helper lists every endpoint as CSV (`/scomma`), sets the console-role
//! default (`/SetDefault`), and can enable/disable endpoints (`/Enable`,
//! `/Disable`). Enumeration chains two strategies in fixed preference order:
//! stdout capture first, then a temp-file export for helper builds that
//! refuse to write to stdout. The chain stops at the first strategy that
//! yields at least one device; partial results are never merged.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::tabular::Table;
use super::{helper_command, resolve_tool, run_helper, AudioProvider};
use crate::device::{AudioDevice, DeviceState, DeviceType};
use crate::error::{Error, Result};

const EXE: &str = "svcl.exe";
const SUBDIR: &str = "svcl";

// Column contract for the CSV listing
const COL_NAME: &str = "Name";
const COL_DEVICE_NAME: &str = "Device Name";
const COL_TYPE: &str = "Type";
const COL_DIRECTION: &str = "Direction";
const COL_DEVICE_STATE: &str = "Device State";
const COL_DEFAULT: &str = "Default";
const COL_COMMAND_LINE_ID: &str = "Command-Line Friendly ID";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_NAME,
    COL_TYPE,
    COL_DIRECTION,
    COL_DEVICE_STATE,
    COL_DEFAULT,
    COL_COMMAND_LINE_ID,
];

/// Console role index understood by the helper. The communications role is
/// deliberately ignored so the model stays one-default-per-type.
const ROLE_CONSOLE: &str = "0";

/// Audio provider backed by the external sound-volume helper.
pub struct SvclProvider {
    tools_dir: Option<PathBuf>,
}

impl SvclProvider {
    #[must_use]
    pub fn new(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    fn tool_path(&self) -> PathBuf {
        resolve_tool(self.tools_dir.as_deref(), SUBDIR, EXE)
    }

    /// Preferred strategy: CSV listing on stdout.
    fn enumerate_stdout(&self) -> Result<Vec<AudioDevice>> {
        let mut cmd = helper_command(&self.tool_path());
        cmd.arg("/scomma").arg("");
        let output = run_helper(cmd, "enumerate audio devices")?;
        let text = String::from_utf8_lossy(&output.stdout);
        devices_from_csv(&text)
    }

    /// Legacy strategy: CSV export to a scratch file.
    fn enumerate_file(&self) -> Result<Vec<AudioDevice>> {
        let scratch = tempfile::tempdir()?;
        let csv_path = scratch.path().join("audio.csv");

        let mut cmd = helper_command(&self.tool_path());
        cmd.arg("/scomma").arg(&csv_path);
        run_helper(cmd, "enumerate audio devices (file export)")?;

        let text = std::fs::read_to_string(&csv_path).map_err(|e| Error::Provider {
            message: format!("enumerate audio devices: could not read helper export: {e}"),
            status: None,
        })?;
        devices_from_csv(&text)
    }
}

impl AudioProvider for SvclProvider {
    fn enumerate(&self) -> Result<Vec<AudioDevice>> {
        let strategies: [(&str, fn(&Self) -> Result<Vec<AudioDevice>>); 2] = [
            ("stdout", Self::enumerate_stdout),
            ("file export", Self::enumerate_file),
        ];

        let mut last_err = None;
        for (label, strategy) in strategies {
            match strategy(self) {
                Ok(devices) if !devices.is_empty() => {
                    debug!(
                        "Audio enumeration via {} returned {} devices",
                        label,
                        devices.len()
                    );
                    return Ok(devices);
                }
                Ok(_) => debug!("Audio enumeration via {} returned no devices", label),
                Err(e) => {
                    debug!("Audio enumeration via {} failed: {}", label, e);
                    last_err = Some(e);
                }
            }
        }

        // Static fallback: no devices. Only an error if every strategy failed.
        match last_err {
            Some(e) => Err(e),
            None => {
                warn!("No audio devices found by any enumeration strategy");
                Ok(Vec::new())
            }
        }
    }

    fn set_default(&self, id: &str, device_type: DeviceType) -> Result<()> {
        // The helper clears the previous default of the same type itself;
        // uniqueness is not a separate step.
        debug!("Setting default {} device: {}", device_type, id);
        let mut cmd = helper_command(&self.tool_path());
        cmd.args(["/SetDefault", id, ROLE_CONSOLE]);
        run_helper(cmd, "set default audio device")?;
        Ok(())
    }

    fn set_enabled(&self, id: &str, enable: bool) -> Result<()> {
        let verb = if enable { "/Enable" } else { "/Disable" };
        let mut cmd = helper_command(&self.tool_path());
        cmd.args([verb, id]);
        run_helper(cmd, "set audio device enabled state")?;
        Ok(())
    }
}

/// Parse a helper CSV listing into typed records, enforcing the column
/// contract.
fn devices_from_csv(text: &str) -> Result<Vec<AudioDevice>> {
    let table = Table::parse(text);
    if table.is_empty() {
        return Ok(Vec::new());
    }
    if !table.has_columns(REQUIRED_COLUMNS) {
        return Err(Error::provider(
            "enumerate audio devices: helper listing is missing required columns",
        ));
    }
    Ok(devices_from_table(&table))
}

/// Build endpoint records from the parsed listing. Only `Device` rows count;
/// the helper also lists subunits and per-application sessions.
fn devices_from_table(table: &Table) -> Vec<AudioDevice> {
    table
        .rows()
        .filter_map(|row| {
            if row.get(COL_TYPE) != Some("Device") {
                return None;
            }

            let device_type = match row.get(COL_DIRECTION) {
                Some("Render") => DeviceType::Output,
                Some("Capture") => DeviceType::Input,
                _ => return None,
            };

            let id = row.get(COL_COMMAND_LINE_ID)?.to_string();
            if id.is_empty() {
                return None;
            }

            let state = parse_state(row.get_or_empty(COL_DEVICE_STATE));

            // Friendly name: the hardware name when present, else the
            // endpoint label.
            let device_name = row.get_or_empty(COL_DEVICE_NAME);
            let name = if device_name.is_empty() {
                row.get_or_empty(COL_NAME).to_string()
            } else {
                device_name.to_string()
            };

            // Console-role default only: "Render" marks the default output,
            // "Capture" the default input.
            let is_default = match device_type {
                DeviceType::Output => row.get(COL_DEFAULT) == Some("Render"),
                DeviceType::Input => row.get(COL_DEFAULT) == Some("Capture"),
            };

            let mut device = AudioDevice {
                id,
                name,
                device_type,
                state,
                is_default,
                is_enabled: false,
                selected: false,
                nickname: None,
            };
            device.sync_enabled();
            Some(device)
        })
        .collect()
}

/// Map the helper's state strings to the four-valued enum. Unknown strings
/// are reported as not-present rather than invented as a fifth state.
fn parse_state(raw: &str) -> DeviceState {
    match raw.to_ascii_lowercase().as_str() {
        "active" => DeviceState::Active,
        "disabled" => DeviceState::Disabled,
        "unplugged" => DeviceState::Unplugged,
        "not present" | "notpresent" => DeviceState::NotPresent,
        other => {
            if !other.is_empty() {
                debug!("Unrecognized device state '{}', treating as notpresent", other);
            }
            DeviceState::NotPresent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LISTING: &str = "\
Name,Type,Direction,Device Name,Default,Default Multimedia,Default Communications,Device State,Command-Line Friendly ID\n\
Speakers,Device,Render,Realtek High Definition Audio,Render,Render,,Active,Realtek High Definition Audio\\Device\\Speakers\\Render\n\
Headset Earphone,Device,Render,HyperX Cloud II,,,Render,Active,HyperX Cloud II\\Device\\Headset Earphone\\Render\n\
Microphone,Device,Capture,HyperX Cloud II,Capture,,,Active,HyperX Cloud II\\Device\\Microphone\\Capture\n\
Digital Out,Device,Render,Realtek High Definition Audio,,,,Unplugged,Realtek High Definition Audio\\Device\\Digital Out\\Render\n\
Line In,Device,Capture,Realtek High Definition Audio,,,,Not present,Realtek High Definition Audio\\Device\\Line In\\Capture\n\
Steam,Application,Render,,,,,Active,Steam.exe\n";

    #[test]
    fn lists_devices_both_directions_and_skips_sessions() {
        let devices = devices_from_csv(LISTING).unwrap();
        assert_eq!(devices.len(), 5);
        assert_eq!(
            devices
                .iter()
                .filter(|d| d.device_type == DeviceType::Output)
                .count(),
            3
        );
        assert_eq!(
            devices
                .iter()
                .filter(|d| d.device_type == DeviceType::Input)
                .count(),
            2
        );
        // Application row never becomes a device
        assert!(devices.iter().all(|d| !d.id.contains("Steam")));
    }

    #[test]
    fn console_role_defaults_are_scoped_per_type() {
        let devices = devices_from_csv(LISTING).unwrap();

        let default_outputs: Vec<_> = devices
            .iter()
            .filter(|d| d.device_type == DeviceType::Output && d.is_default)
            .collect();
        assert_eq!(default_outputs.len(), 1);
        assert!(default_outputs[0].id.ends_with("Speakers\\Render"));

        let default_inputs: Vec<_> = devices
            .iter()
            .filter(|d| d.device_type == DeviceType::Input && d.is_default)
            .collect();
        assert_eq!(default_inputs.len(), 1);

        // Communications-role default does not count
        let headset = devices
            .iter()
            .find(|d| d.id.contains("Headset"))
            .unwrap();
        assert!(!headset.is_default);
    }

    #[test]
    fn state_mapping_and_derived_enabled() {
        let devices = devices_from_csv(LISTING).unwrap();

        let digital = devices.iter().find(|d| d.id.contains("Digital")).unwrap();
        assert_eq!(digital.state, DeviceState::Unplugged);
        assert!(!digital.is_enabled);

        let line_in = devices.iter().find(|d| d.id.contains("Line In")).unwrap();
        assert_eq!(line_in.state, DeviceState::NotPresent);

        let speakers = devices.iter().find(|d| d.id.contains("Speakers")).unwrap();
        assert_eq!(speakers.state, DeviceState::Active);
        assert!(speakers.is_enabled);
    }

    #[test]
    fn friendly_name_prefers_hardware_name() {
        let devices = devices_from_csv(LISTING).unwrap();
        let speakers = devices.iter().find(|d| d.id.contains("Speakers")).unwrap();
        assert_eq!(speakers.name, "Realtek High Definition Audio");
    }

    #[test]
    fn missing_columns_fail_the_contract() {
        let err = devices_from_csv("Name,Direction\nSpeakers,Render\n").unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        assert!(devices_from_csv("").unwrap().is_empty());
    }

    #[test]
    fn unknown_state_string_maps_to_notpresent() {
        assert_eq!(parse_state("Borked"), DeviceState::NotPresent);
        assert_eq!(parse_state("ACTIVE"), DeviceState::Active);
    }
}
