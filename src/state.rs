//! Reconciler state
//!
//! Owns the authoritative in-memory device lists, decorates raw provider
//! output with the nickname/ignore overlays, and drives the save/apply
//! workflows. Three exclusivity locks serialize the startup sequence,
//! monitor enumeration, and audio enumeration; profile apply runs under the
//! same discipline as the enumeration of the device class it touches.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::device::{AudioDevice, DeviceState, Monitor, Profile};
use crate::error::{Error, Result};
use crate::provider::{AudioProvider, MonitorProvider};
use crate::store::{IgnoreList, Nicknames, Storage};

/// The reconciliation engine: single authoritative state instance, accessed
/// synchronously by request/response calls from the front end.
pub struct State {
    monitor_provider: Box<dyn MonitorProvider>,
    audio_provider: Box<dyn AudioProvider>,
    storage: Storage,

    monitors: Vec<Monitor>,
    audio_devices: Vec<AudioDevice>,
    profiles: Vec<Profile>,
    ignore_list: IgnoreList,
    nicknames: Nicknames,

    // Exclusivity classes: the startup lock covers the persisted-state load,
    // the enumeration locks are acquired immediately before the OS query and
    // released right after decoration. Never held across caller callbacks.
    startup_lock: Mutex<()>,
    monitor_enum_lock: Mutex<()>,
    audio_enum_lock: Mutex<()>,
}

impl State {
    /// Build a reconciler around injected providers and storage. Device
    /// lists start empty; call [`State::startup`] to populate them.
    #[must_use]
    pub fn new(
        monitor_provider: Box<dyn MonitorProvider>,
        audio_provider: Box<dyn AudioProvider>,
        storage: Storage,
    ) -> Self {
        Self {
            monitor_provider,
            audio_provider,
            storage,
            monitors: Vec::new(),
            audio_devices: Vec::new(),
            profiles: Vec::new(),
            ignore_list: IgnoreList::default(),
            nicknames: Nicknames::default(),
            startup_lock: Mutex::new(()),
            monitor_enum_lock: Mutex::new(()),
            audio_enum_lock: Mutex::new(()),
        }
    }

    /// Load persisted overlays and profiles, then enumerate both device
    /// classes. Load failures fall back to empty defaults and enumeration
    /// failures degrade to empty lists; startup never fails outright.
    pub fn startup(&mut self) {
        {
            let _guard = lock(&self.startup_lock);

            self.ignore_list = self.storage.load_ignore_list().unwrap_or_else(|e| {
                warn!("Could not load ignore list, starting empty: {e}");
                IgnoreList::default()
            });
            self.nicknames = self.storage.load_nicknames().unwrap_or_else(|e| {
                warn!("Could not load nicknames, starting empty: {e}");
                Nicknames::default()
            });
            self.profiles = self.storage.load_profiles().unwrap_or_else(|e| {
                warn!("Could not load profiles, starting empty: {e}");
                Vec::new()
            });
        }

        if let Err(e) = self.refresh_monitors() {
            warn!("Monitor enumeration failed at startup: {e}");
        }
        if let Err(e) = self.refresh_audio_devices(false) {
            warn!("Audio enumeration failed at startup: {e}");
        }

        info!(
            "Startup complete: {} monitors, {} audio devices, {} profiles",
            self.monitors.len(),
            self.audio_devices.len(),
            self.profiles.len()
        );
    }

    // ========================================================================
    // Enumeration & Decoration
    // ========================================================================

    /// Rebuild the monitor list from the provider. On failure the visible
    /// list degrades to empty and the error is reported to the caller.
    pub fn refresh_monitors(&mut self) -> Result<&[Monitor]> {
        let decorated = {
            let _guard = lock(&self.monitor_enum_lock);
            match self.monitor_provider.enumerate() {
                Ok(mut monitors) => {
                    for monitor in &mut monitors {
                        monitor.nickname = self
                            .nicknames
                            .monitor(&monitor.device_handle)
                            .map(String::from);
                    }
                    monitors
                }
                Err(e) => {
                    self.monitors.clear();
                    return Err(e);
                }
            }
        };
        self.monitors = decorated;
        Ok(&self.monitors)
    }

    /// Rebuild the audio device list from the provider. Records are replaced
    /// wholesale; the transient `selected` flag is carried over by id only
    /// when the caller asks for it.
    pub fn refresh_audio_devices(&mut self, preserve_selection: bool) -> Result<&[AudioDevice]> {
        let selected: HashSet<String> = if preserve_selection {
            self.audio_devices
                .iter()
                .filter(|d| d.selected)
                .map(|d| d.id.clone())
                .collect()
        } else {
            HashSet::new()
        };

        let decorated = {
            let _guard = lock(&self.audio_enum_lock);
            match self.audio_provider.enumerate() {
                Ok(mut devices) => {
                    for device in &mut devices {
                        device.nickname = self.nicknames.audio(&device.id).map(String::from);
                        device.selected = selected.contains(&device.id);
                    }
                    devices
                }
                Err(e) => {
                    self.audio_devices.clear();
                    return Err(e);
                }
            }
        };
        self.audio_devices = decorated;
        Ok(&self.audio_devices)
    }

    #[must_use]
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    #[must_use]
    pub fn audio_devices(&self) -> &[AudioDevice] {
        &self.audio_devices
    }

    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Partition the decorated audio list into (filtered, ignored). The two
    /// sets are disjoint and together cover every known device.
    #[must_use]
    pub fn audio_partition(&self) -> (Vec<&AudioDevice>, Vec<&AudioDevice>) {
        self.audio_devices
            .iter()
            .partition(|d| !self.ignore_list.contains(&d.id))
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    /// Add an audio device id to the ignore list and persist immediately.
    pub fn ignore_audio_device(&mut self, id: &str) -> Result<()> {
        self.ignore_list.add(id)?;
        self.storage.save_ignore_list(&self.ignore_list)
    }

    /// Remove an audio device id from the ignore list and persist.
    pub fn unignore_audio_device(&mut self, id: &str) -> Result<()> {
        self.ignore_list.remove(id)?;
        self.storage.save_ignore_list(&self.ignore_list)
    }

    #[must_use]
    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore_list
    }

    /// Set or clear a monitor nickname (empty clears), persist, and update
    /// the decorated in-memory record.
    pub fn set_monitor_nickname(&mut self, device_handle: &str, nickname: &str) -> Result<()> {
        self.nicknames.set_monitor(device_handle, nickname);
        self.storage.save_nicknames(&self.nicknames)?;
        if let Some(monitor) = self
            .monitors
            .iter_mut()
            .find(|m| m.device_handle == device_handle)
        {
            monitor.nickname = (!nickname.is_empty()).then(|| nickname.to_string());
        }
        Ok(())
    }

    /// Set or clear an audio device nickname (empty clears), persist, and
    /// update the decorated in-memory record.
    pub fn set_audio_nickname(&mut self, id: &str, nickname: &str) -> Result<()> {
        self.nicknames.set_audio(id, nickname);
        self.storage.save_nicknames(&self.nicknames)?;
        if let Some(device) = self.audio_devices.iter_mut().find(|d| d.id == id) {
            device.nickname = (!nickname.is_empty()).then(|| nickname.to_string());
        }
        Ok(())
    }

    /// Flip the transient selection flag on an audio device.
    pub fn set_audio_selected(&mut self, id: &str, selected: bool) -> Result<()> {
        let device = self
            .audio_devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("audio device {id}")))?;
        device.selected = selected;
        Ok(())
    }

    // ========================================================================
    // Device Control
    // ========================================================================

    /// Make a monitor the primary display. The soft restart-required outcome
    /// is logged and otherwise treated as success, since the change did take
    /// effect.
    pub fn set_primary_monitor(&mut self, device_handle: &str) -> Result<()> {
        if !self
            .monitors
            .iter()
            .any(|m| m.device_handle == device_handle)
        {
            return Err(Error::NotFound(format!("monitor {device_handle}")));
        }

        match self.monitor_provider.set_primary(device_handle) {
            Ok(()) => {}
            Err(e) if e.is_soft() => warn!("{e}"),
            Err(e) => return Err(e),
        }

        // Exactly one primary among active monitors, and a primary is always
        // active and enabled.
        for monitor in &mut self.monitors {
            let is_target = monitor.device_handle == device_handle;
            monitor.is_primary = is_target;
            if is_target {
                monitor.is_active = true;
                monitor.is_enabled = true;
            }
        }
        Ok(())
    }

    /// Activate or deactivate a monitor. Deactivating the current primary is
    /// rejected up front; it must be demoted explicitly first.
    pub fn set_monitor_active(&mut self, device_handle: &str, active: bool) -> Result<()> {
        let monitor = self
            .monitors
            .iter()
            .find(|m| m.device_handle == device_handle)
            .ok_or_else(|| Error::NotFound(format!("monitor {device_handle}")))?;

        if monitor.is_primary && !active {
            return Err(Error::InvalidArgument(format!(
                "cannot deactivate the primary monitor {device_handle}"
            )));
        }

        match self.monitor_provider.set_active(device_handle, active) {
            Ok(()) => {}
            Err(e) if e.is_soft() => warn!("{e}"),
            Err(e) => return Err(e),
        }

        if let Some(monitor) = self
            .monitors
            .iter_mut()
            .find(|m| m.device_handle == device_handle)
        {
            monitor.is_active = active;
            monitor.is_enabled = active;
        }
        Ok(())
    }

    /// Make an audio device the default for its type (console role). The
    /// provider guarantees uniqueness on the OS side; the in-memory list is
    /// updated to match.
    pub fn set_default_audio(&mut self, id: &str) -> Result<()> {
        let device_type = self
            .audio_devices
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.device_type)
            .ok_or_else(|| Error::NotFound(format!("audio device {id}")))?;

        self.audio_provider.set_default(id, device_type)?;

        for device in &mut self.audio_devices {
            if device.device_type == device_type {
                device.is_default = device.id == id;
            }
        }
        Ok(())
    }

    /// Enable or disable an audio endpoint. `Unsupported` from the provider
    /// propagates so callers can decide how to treat the gap.
    pub fn set_audio_enabled(&mut self, id: &str, enable: bool) -> Result<()> {
        if !self.audio_devices.iter().any(|d| d.id == id) {
            return Err(Error::NotFound(format!("audio device {id}")));
        }

        self.audio_provider.set_enabled(id, enable)?;

        if let Some(device) = self.audio_devices.iter_mut().find(|d| d.id == id) {
            device.state = if enable {
                DeviceState::Active
            } else {
                DeviceState::Disabled
            };
            device.sync_enabled();
        }
        Ok(())
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Snapshot the current state under a new name: the full monitor list
    /// verbatim plus the audio devices that are selected and not ignored.
    /// The in-memory list is reloaded from storage afterwards to confirm the
    /// write actually landed.
    pub fn save_profile(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "profile name cannot be empty".to_string(),
            ));
        }
        if self.profiles.iter().any(|p| p.name == name) {
            return Err(Error::AlreadyExists(format!("profile {name}")));
        }

        let audio_devices: Vec<AudioDevice> = self
            .audio_devices
            .iter()
            .filter(|d| d.selected && !self.ignore_list.contains(&d.id))
            .cloned()
            .collect();

        let profile = Profile {
            name: name.to_string(),
            monitors: self.monitors.clone(),
            audio_devices,
        };

        self.profiles.push(profile);
        self.storage.save_profiles(&self.profiles)?;

        // Durability check: what we hold must be what the disk holds.
        self.profiles = self.storage.load_profiles()?;
        info!("Saved profile '{name}'");
        Ok(())
    }

    /// Apply a saved profile: monitors first (delegated to the provider in
    /// the profile's stored order), then each saved audio device. Aborts on
    /// the first hard failure reporting which step failed; steps already
    /// applied are not rolled back.
    pub fn apply_profile(&mut self, name: &str) -> Result<()> {
        let profile = self
            .profiles
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("profile {name}")))?;

        info!("Applying profile '{name}'");

        {
            // Apply must not interleave with a concurrent monitor enumeration.
            let _guard = lock(&self.monitor_enum_lock);
            self.monitor_provider.apply_profile(&profile)?;
        }

        let _guard = lock(&self.audio_enum_lock);
        for device in &profile.audio_devices {
            if device.is_default {
                self.audio_provider
                    .set_default(&device.id, device.device_type)
                    .map_err(|e| e.in_step(format!("set default audio {}", device.id)))?;
            }
            match self
                .audio_provider
                .set_enabled(&device.id, device.is_enabled)
            {
                Ok(()) => {}
                // A platform without endpoint enable/disable should not
                // block the rest of the profile.
                Err(Error::Unsupported(what)) => {
                    warn!(
                        "Skipping enabled-state for {}: {what} is unsupported",
                        device.id
                    );
                }
                Err(e) => {
                    return Err(e.in_step(format!("set enabled audio {}", device.id)));
                }
            }
        }

        Ok(())
    }

    /// Delete a saved profile from memory and disk, sweeping any leftover
    /// legacy display blob for that name.
    pub fn delete_profile(&mut self, name: &str) -> Result<()> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.name != name);
        if self.profiles.len() == before {
            return Err(Error::NotFound(format!("profile {name}")));
        }

        self.storage.save_profiles(&self.profiles)?;
        self.storage.remove_legacy_display_blob(name)?;
        info!("Deleted profile '{name}'");
        Ok(())
    }
}

/// Scoped lock acquisition that survives a poisoned mutex: the protected
/// data lives outside the mutex, so a panic in another holder leaves nothing
/// to corrupt.
fn lock(mutex: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
