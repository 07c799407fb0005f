//! Monitor adapter driving a MultiMonitorTool-style helper
//!
//! The helper exports the display table as CSV (`/scomma`) and performs
//! topology changes (`/SetPrimary`, `/enable`, `/disable`), relaying the OS
//! display-change status as its exit code. The column contract and the exit
//! code taxonomy live here; callers only ever see typed `Monitor` records
//! and the crate error kinds.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::tabular::Table;
use super::{helper_command, resolve_tool, run_helper, MonitorProvider};
use crate::device::{Bounds, Monitor};
use crate::error::{Error, Result};

const EXE: &str = "MultiMonitorTool.exe";
const SUBDIR: &str = "multimonitortool";

// Column contract for the CSV export
const COL_NAME: &str = "Name";
const COL_MONITOR_NAME: &str = "Monitor Name";
const COL_ACTIVE: &str = "Active";
const COL_DISCONNECTED: &str = "Disconnected";
const COL_PRIMARY: &str = "Primary";
const COL_LEFT_TOP: &str = "Left-Top";
const COL_RESOLUTION: &str = "Resolution";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_NAME,
    COL_MONITOR_NAME,
    COL_ACTIVE,
    COL_DISCONNECTED,
    COL_PRIMARY,
];

// Display-change status codes relayed by the helper (ChangeDisplaySettings)
const DISP_CHANGE_SUCCESSFUL: i32 = 0;
const DISP_CHANGE_RESTART: i32 = 1;
const DISP_CHANGE_FAILED: i32 = -1;
const DISP_CHANGE_BADMODE: i32 = -2;
const DISP_CHANGE_NOTUPDATED: i32 = -3;
const DISP_CHANGE_BADFLAGS: i32 = -4;
const DISP_CHANGE_BADPARAM: i32 = -5;

/// Monitor provider backed by the external multi-monitor helper.
pub struct MultiMonProvider {
    tools_dir: Option<PathBuf>,
}

impl MultiMonProvider {
    #[must_use]
    pub fn new(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    fn tool_path(&self) -> PathBuf {
        resolve_tool(self.tools_dir.as_deref(), SUBDIR, EXE)
    }

    /// Issue a display-change command and map the relayed status code.
    fn run_display_change(&self, args: &[&str], what: &str) -> Result<()> {
        let mut cmd = helper_command(&self.tool_path());
        cmd.args(args);

        let output = cmd.output().map_err(|e| Error::Provider {
            message: format!("{what}: failed to run helper: {e}"),
            status: None,
        })?;

        map_display_change(output.status.code(), what)
    }
}

impl MonitorProvider for MultiMonProvider {
    fn enumerate(&self) -> Result<Vec<Monitor>> {
        // Export to a scratch file; the helper has no stdout mode for the
        // display table. The directory (and the CSV in it) is removed on drop.
        let scratch = tempfile::tempdir().map_err(|e| Error::Provider {
            message: format!("enumerate monitors: could not create scratch dir: {e}"),
            status: None,
        })?;
        let csv_path = scratch.path().join("monitors.csv");

        let mut cmd = helper_command(&self.tool_path());
        cmd.arg("/scomma").arg(&csv_path);
        run_helper(cmd, "enumerate monitors")?;

        let text = std::fs::read_to_string(&csv_path).map_err(|e| Error::Provider {
            message: format!("enumerate monitors: could not read helper export: {e}"),
            status: None,
        })?;

        let table = Table::parse(&text);
        if !table.has_columns(REQUIRED_COLUMNS) {
            return Err(Error::provider(
                "enumerate monitors: helper export is missing required columns",
            ));
        }

        let monitors = monitors_from_table(&table);
        debug!("Enumerated {} display devices", monitors.len());
        Ok(monitors)
    }

    fn set_primary(&self, device_handle: &str) -> Result<()> {
        // Confirm the target exists and has current geometry before issuing
        // the change; a handle the OS no longer knows is a lookup miss, not
        // a provider failure.
        let monitors = self.enumerate()?;
        let target = monitors
            .iter()
            .find(|m| m.device_handle == device_handle)
            .ok_or_else(|| Error::NotFound(format!("monitor {device_handle}")))?;
        if target.is_active && target.bounds.is_zero() {
            warn!(
                "Monitor {} has no retrievable geometry; attempting primary change anyway",
                device_handle
            );
        }

        self.run_display_change(&["/SetPrimary", device_handle], "set primary")
    }

    fn set_active(&self, device_handle: &str, active: bool) -> Result<()> {
        // Deactivation parks the device at a reserved off-screen coordinate
        // inside the helper; the device stays in the topology.
        let verb = if active { "/enable" } else { "/disable" };
        self.run_display_change(&[verb, device_handle], "set active state")
    }
}

/// Map a relayed display-change status code to the error taxonomy.
fn map_display_change(code: Option<i32>, what: &str) -> Result<()> {
    match code {
        Some(DISP_CHANGE_SUCCESSFUL) => Ok(()),
        Some(DISP_CHANGE_RESTART) => Err(Error::RestartRequired),
        Some(DISP_CHANGE_BADMODE) => Err(Error::BadMode),
        Some(DISP_CHANGE_BADPARAM) | Some(DISP_CHANGE_BADFLAGS) => Err(Error::BadParameter),
        Some(DISP_CHANGE_NOTUPDATED) => Err(Error::NotUpdated),
        Some(DISP_CHANGE_FAILED) => Err(Error::Provider {
            message: format!("{what}: display settings change failed"),
            status: Some(DISP_CHANGE_FAILED),
        }),
        other => Err(Error::Provider {
            message: format!("{what}: helper terminated abnormally"),
            status: other,
        }),
    }
}

/// Build monitor records from the parsed export. Rows without a device name
/// are skipped; geometry failures degrade to zeroed bounds.
fn monitors_from_table(table: &Table) -> Vec<Monitor> {
    table
        .rows()
        .filter_map(|row| {
            let handle = row.get(COL_NAME)?.to_string();
            if handle.is_empty() {
                return None;
            }

            let is_active = row.get_bool(COL_ACTIVE);
            let bounds = if is_active {
                parse_bounds(
                    row.get_or_empty(COL_LEFT_TOP),
                    row.get_or_empty(COL_RESOLUTION),
                )
                .unwrap_or_default()
            } else {
                Bounds::default()
            };

            Some(Monitor {
                display_name: row.get_or_empty(COL_MONITOR_NAME).to_string(),
                device_handle: handle,
                is_primary: row.get_bool(COL_PRIMARY),
                is_active,
                // User-controlled flag; freshly enumerated devices start enabled
                is_enabled: true,
                bounds,
                nickname: None,
            })
        })
        .collect()
}

/// Parse `"X, Y"` position and `"W X H"` resolution fields into bounds.
fn parse_bounds(left_top: &str, resolution: &str) -> Option<Bounds> {
    let (x, y) = split_pair(left_top, ',')?;
    let (width, height) = split_pair(&resolution.to_ascii_lowercase(), 'x')?;
    Some(Bounds {
        x,
        y,
        width,
        height,
    })
}

fn split_pair(text: &str, sep: char) -> Option<(i32, i32)> {
    let (a, b) = text.split_once(sep)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXPORT: &str = "\
Resolution,Left-Top,Right-Bottom,Active,Disconnected,Primary,Name,Monitor Name\n\
3840 X 2160,\"0, 0\",\"3840, 2160\",Yes,No,Yes,\\\\.\\DISPLAY1,Dell U2720Q\n\
1920 X 1080,\"3840, 0\",\"5760, 1080\",Yes,No,No,\\\\.\\DISPLAY2,\"LG, UltraWide\"\n\
,,,No,Yes,No,\\\\.\\DISPLAY3,Old VGA\n";

    #[test]
    fn builds_monitors_in_export_order() {
        let table = Table::parse(EXPORT);
        let monitors = monitors_from_table(&table);

        assert_eq!(monitors.len(), 3);
        assert_eq!(monitors[0].device_handle, "\\\\.\\DISPLAY1");
        assert!(monitors[0].is_primary);
        assert!(monitors[0].is_active);
        assert_eq!(
            monitors[0].bounds,
            Bounds {
                x: 0,
                y: 0,
                width: 3840,
                height: 2160
            }
        );
        assert_eq!(monitors[1].display_name, "LG, UltraWide");
        assert_eq!(monitors[1].bounds.x, 3840);
    }

    #[test]
    fn inactive_device_appears_with_zeroed_bounds() {
        let table = Table::parse(EXPORT);
        let monitors = monitors_from_table(&table);

        let vga = &monitors[2];
        assert!(!vga.is_active);
        assert!(!vga.is_primary);
        assert!(vga.bounds.is_zero());
        // Enumeration never drops a known device
        assert_eq!(vga.display_name, "Old VGA");
    }

    #[test]
    fn unparseable_geometry_degrades_to_zeroed_bounds() {
        let export = "\
Resolution,Left-Top,Active,Disconnected,Primary,Name,Monitor Name\n\
garbage,also garbage,Yes,No,Yes,\\\\.\\DISPLAY1,Main\n";
        let monitors = monitors_from_table(&Table::parse(export));
        assert_eq!(monitors.len(), 1);
        assert!(monitors[0].bounds.is_zero());
    }

    #[test]
    fn enumerated_devices_start_enabled() {
        let table = Table::parse(EXPORT);
        assert!(monitors_from_table(&table).iter().all(|m| m.is_enabled));
    }

    #[test]
    fn display_change_taxonomy_is_distinguishable() {
        assert!(map_display_change(Some(0), "t").is_ok());
        assert!(matches!(
            map_display_change(Some(1), "t"),
            Err(Error::RestartRequired)
        ));
        assert!(matches!(
            map_display_change(Some(-2), "t"),
            Err(Error::BadMode)
        ));
        assert!(matches!(
            map_display_change(Some(-5), "t"),
            Err(Error::BadParameter)
        ));
        assert!(matches!(
            map_display_change(Some(-3), "t"),
            Err(Error::NotUpdated)
        ));
        assert!(matches!(
            map_display_change(Some(-1), "t"),
            Err(Error::Provider {
                status: Some(-1),
                ..
            })
        ));
        assert!(matches!(
            map_display_change(None, "t"),
            Err(Error::Provider { status: None, .. })
        ));
    }

    #[test]
    fn bounds_parsing_is_lenient_about_spacing() {
        assert_eq!(
            parse_bounds("1920,0", "1920 x 1080"),
            Some(Bounds {
                x: 1920,
                y: 0,
                width: 1920,
                height: 1080
            })
        );
        assert_eq!(parse_bounds("", "1920 X 1080"), None);
    }
}
