//! Device data model
//!
//! Normalized records for monitors and audio endpoints, rebuilt wholesale on
//! every enumeration. The stable identifiers (`device_handle`, `id`) survive
//! re-enumeration and key the nickname/ignore overlays; everything else is
//! transient OS-reported state.

use serde::{Deserialize, Serialize};

/// Monitor position and resolution. Valid only while the monitor is active;
/// zeroed when geometry could not be retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Bounds::default()
    }
}

/// A display device as reported by the OS, decorated with overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    /// Stable OS identifier (not the human label).
    pub device_handle: String,
    /// Human-readable label.
    pub display_name: String,
    pub is_primary: bool,
    pub is_active: bool,
    /// User-controlled enable flag, independent of `is_active`.
    pub is_enabled: bool,
    #[serde(default)]
    pub bounds: Bounds,
    /// Nickname overlay; absent means no nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// Direction of an audio endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Output,
    Input,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Output => write!(f, "output"),
            DeviceType::Input => write!(f, "input"),
        }
    }
}

/// OS-reported endpoint state, mapped from the native state bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Active,
    Disabled,
    #[serde(rename = "notpresent")]
    NotPresent,
    Unplugged,
}

/// An audio endpoint as reported by the OS, decorated with overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevice {
    /// Stable command-line/endpoint identifier.
    pub id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub state: DeviceState,
    /// Default for its type, console role only.
    pub is_default: bool,
    /// Derived: `state == Active`.
    pub is_enabled: bool,
    /// Transient UI flag; persisted only inside profile snapshots.
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl AudioDevice {
    /// Re-derive `is_enabled` from the state field.
    pub fn sync_enabled(&mut self) {
        self.is_enabled = self.state == DeviceState::Active;
    }
}

/// A self-contained snapshot of device intent, copied at save time.
/// Never holds live references to the runtime device lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    /// Full monitor list with desired active/primary/bounds.
    pub monitors: Vec<Monitor>,
    /// Audio devices that were selected and not ignored at save time.
    pub audio_devices: Vec<AudioDevice>,
}
