//! Persistence for profiles and overlays
//!
//! Three independent JSON documents under a dot-prefixed settings directory
//! in the user's home: the profile list (single aggregate file), the
//! nickname overlay, and the audio ignore list. Files are created on
//! demand and written via write-temp-then-rename so a crash mid-write never
//! truncates an existing document.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::device::Profile;
use crate::error::{Error, Result};

/// Dot-prefixed settings directory under `$HOME`.
pub const SETTINGS_DIR: &str = ".devprof";

const PROFILES_FILE: &str = "profiles.json";
const NICKNAMES_FILE: &str = "nicknames.json";
const IGNORE_FILE: &str = "ignore_list.json";

// ============================================================================
// Overlay Documents
// ============================================================================

/// Audio device ids excluded from the default-facing view. Membership only
/// partitions the device list; it never deletes a device from enumeration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreList {
    pub audio_devices: Vec<String>,
}

impl IgnoreList {
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.audio_devices.iter().any(|d| d == id)
    }

    /// Add an id; adding one already present is an error, not a no-op.
    pub fn add(&mut self, id: &str) -> Result<()> {
        if self.contains(id) {
            return Err(Error::AlreadyIgnored(id.to_string()));
        }
        self.audio_devices.push(id.to_string());
        Ok(())
    }

    /// Remove an id; removing one not present is an error, not a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let before = self.audio_devices.len();
        self.audio_devices.retain(|d| d != id);
        if self.audio_devices.len() == before {
            return Err(Error::NotIgnored(id.to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.audio_devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.audio_devices.is_empty()
    }
}

/// Nickname overlay: stable device id to nickname, one map per device
/// class. Absence of a key means "no nickname", never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nicknames {
    pub monitors: BTreeMap<String, String>,
    pub audio_devices: BTreeMap<String, String>,
}

impl Nicknames {
    #[must_use]
    pub fn monitor(&self, device_handle: &str) -> Option<&str> {
        self.monitors.get(device_handle).map(String::as_str)
    }

    #[must_use]
    pub fn audio(&self, id: &str) -> Option<&str> {
        self.audio_devices.get(id).map(String::as_str)
    }

    /// Set a monitor nickname; an empty string removes the mapping rather
    /// than storing an empty nickname.
    pub fn set_monitor(&mut self, device_handle: &str, nickname: &str) {
        if nickname.is_empty() {
            self.monitors.remove(device_handle);
        } else {
            self.monitors
                .insert(device_handle.to_string(), nickname.to_string());
        }
    }

    /// Set an audio device nickname; an empty string removes the mapping.
    pub fn set_audio(&mut self, id: &str, nickname: &str) {
        if nickname.is_empty() {
            self.audio_devices.remove(id);
        } else {
            self.audio_devices
                .insert(id.to_string(), nickname.to_string());
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// File-backed storage rooted at the settings directory.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Storage in the default location under the invoking user's home.
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            Error::InvalidArgument("could not determine the user's home directory".to_string())
        })?;
        Ok(Self::at(home.join(SETTINGS_DIR)))
    }

    /// Storage rooted at an explicit directory (tests, portable installs).
    #[must_use]
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // --- profiles -----------------------------------------------------------

    /// Load the profile list. A missing file is an empty list; a malformed
    /// one is an error the caller may choose to degrade.
    pub fn load_profiles(&self) -> Result<Vec<Profile>> {
        self.read_json(PROFILES_FILE)
    }

    pub fn save_profiles(&self, profiles: &[Profile]) -> Result<()> {
        self.write_json(PROFILES_FILE, &profiles)
    }

    /// Remove a leftover per-profile display blob from the abandoned
    /// one-file-per-profile format. Missing file is fine; any other
    /// filesystem error is not.
    pub fn remove_legacy_display_blob(&self, profile_name: &str) -> Result<()> {
        let path = self.dir.join(format!("{profile_name}-display.cfg"));
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed legacy display blob {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e)),
        }
    }

    // --- overlays -----------------------------------------------------------

    pub fn load_ignore_list(&self) -> Result<IgnoreList> {
        self.read_json(IGNORE_FILE)
    }

    pub fn save_ignore_list(&self, list: &IgnoreList) -> Result<()> {
        self.write_json(IGNORE_FILE, list)
    }

    pub fn load_nicknames(&self) -> Result<Nicknames> {
        self.read_json(NICKNAMES_FILE)
    }

    pub fn save_nicknames(&self, nicknames: &Nicknames) -> Result<()> {
        self.write_json(NICKNAMES_FILE, nicknames)
    }

    // --- plumbing -----------------------------------------------------------

    fn read_json<T: for<'de> Deserialize<'de> + Default>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{:?} does not exist yet, using defaults", path);
                return Ok(T::default());
            }
            Err(e) => return Err(Error::Storage(e)),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        let data = serde_json::to_vec_pretty(value)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&data)?;
        tmp.persist(&path).map_err(|e| {
            warn!("Failed to persist {:?}: {}", path, e.error);
            Error::Storage(e.error)
        })?;
        Ok(())
    }
}
