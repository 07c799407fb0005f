//! CLI commands
//!
//! Human-readable and JSON rendering for every subcommand, plus the thin
//! glue between CLI arguments and reconciler operations. The reconciler
//! returns typed errors; this layer adds user-facing context with anyhow.

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use crate::device::{AudioDevice, DeviceState, DeviceType, Monitor};
use crate::state::State;
use crate::style::DevprofStyle;

// ============================================================================
// Query Commands
// ============================================================================

/// Overview of both device classes and the saved profiles.
///
/// # Errors
/// Returns an error if JSON serialization fails (device enumeration errors
/// were already degraded at startup).
pub fn status(state: &State) -> Result<()> {
    print_monitor_section(state.monitors());

    println!();
    let (filtered, ignored) = state.audio_partition();
    print_audio_section(&filtered, ignored.len());

    println!();
    println!("{}", "PROFILES:".header());
    println!("{}", "-".repeat(9));
    if state.profiles().is_empty() {
        println!("  {}", "(none saved)".dim());
    } else {
        for profile in state.profiles() {
            println!(
                "  {} ({} monitors, {} audio devices)",
                profile.name.as_str().bold(),
                profile.monitors.len().to_string().technical(),
                profile.audio_devices.len().to_string().technical()
            );
        }
    }

    Ok(())
}

/// List display devices.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn list_monitors(state: &State, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(state.monitors())?);
    } else {
        print_monitor_section(state.monitors());
    }
    Ok(())
}

/// List audio endpoints, optionally including the ignored partition.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn list_audio(state: &State, include_ignored: bool, json_output: bool) -> Result<()> {
    let (filtered, ignored) = state.audio_partition();

    if json_output {
        if include_ignored {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "audioDevices": filtered,
                    "ignoredAudioDevices": ignored,
                }))?
            );
        } else {
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        return Ok(());
    }

    print_audio_section(&filtered, ignored.len());

    if include_ignored && !ignored.is_empty() {
        println!("\n{}", "IGNORED:".header());
        println!("{}", "-".repeat(8));
        for device in &ignored {
            print_audio_line(device);
        }
    }

    Ok(())
}

/// List saved profiles.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn profiles(state: &State, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(state.profiles())?);
        return Ok(());
    }

    if state.profiles().is_empty() {
        println!("{}", "No profiles saved.".dim());
        return Ok(());
    }

    println!("{}", "PROFILES:".header());
    println!("{}", "-".repeat(9));
    for profile in state.profiles() {
        println!("  {}", profile.name.as_str().bold());
        for monitor in &profile.monitors {
            let marker = if monitor.is_primary { "*" } else { " " };
            println!(
                "    {} {} {}",
                marker.dim(),
                monitor.device_handle.as_str().technical(),
                label(&monitor.display_name, monitor.nickname.as_deref()).dim()
            );
        }
        for device in &profile.audio_devices {
            let marker = if device.is_default { "*" } else { " " };
            println!(
                "    {} [{}] {}",
                marker.dim(),
                device.device_type.to_string().dim(),
                label(&device.name, device.nickname.as_deref())
            );
        }
    }

    Ok(())
}

// ============================================================================
// Profile Commands
// ============================================================================

/// Save the current arrangement under a new name. The audio ids name which
/// endpoints join the snapshot; the monitor layout is always included whole.
///
/// # Errors
/// Returns an error for an empty or duplicate name, an unknown audio id, or
/// a storage failure.
pub fn save(state: &mut State, name: &str, audio_ids: &[String]) -> Result<()> {
    for id in audio_ids {
        state
            .set_audio_selected(id, true)
            .with_context(|| format!("cannot include audio device '{id}'"))?;
    }

    state
        .save_profile(name)
        .with_context(|| format!("failed to save profile '{name}'"))?;

    println!(
        "{} {} ({} monitors, {} audio devices)",
        "Saved:".success(),
        name.bold(),
        state.monitors().len().to_string().technical(),
        audio_ids.len().to_string().technical()
    );
    Ok(())
}

/// Apply a saved profile.
///
/// # Errors
/// Returns an error if the profile does not exist or a device change fails;
/// the message names the step that failed.
pub fn apply(state: &mut State, name: &str) -> Result<()> {
    state
        .apply_profile(name)
        .with_context(|| format!("failed to apply profile '{name}'"))?;

    println!("{} {}", "Applied:".success(), name.bold());
    Ok(())
}

/// Delete a saved profile.
///
/// # Errors
/// Returns an error if the profile does not exist or persistence fails.
pub fn delete(state: &mut State, name: &str) -> Result<()> {
    state
        .delete_profile(name)
        .with_context(|| format!("failed to delete profile '{name}'"))?;

    println!("{} {}", "Deleted:".success(), name.bold());
    Ok(())
}

// ============================================================================
// Device Commands
// ============================================================================

/// Make a monitor the primary display.
///
/// # Errors
/// Returns an error if the handle is unknown or the display change fails.
pub fn set_primary(state: &mut State, handle: &str) -> Result<()> {
    state
        .set_primary_monitor(handle)
        .with_context(|| format!("failed to set primary monitor '{handle}'"))?;

    println!("{} {}", "Primary:".success(), handle.bold());
    Ok(())
}

/// Activate or deactivate a monitor.
///
/// # Errors
/// Returns an error if the handle is unknown, the target is the current
/// primary (for deactivation), or the display change fails.
pub fn set_monitor_active(state: &mut State, handle: &str, active: bool) -> Result<()> {
    let verb = if active { "activate" } else { "deactivate" };
    state
        .set_monitor_active(handle, active)
        .with_context(|| format!("failed to {verb} monitor '{handle}'"))?;

    let prefix = if active { "Activated:" } else { "Deactivated:" };
    println!("{} {}", prefix.success(), handle.bold());
    Ok(())
}

/// Make an audio device the default for its type.
///
/// # Errors
/// Returns an error if the id is unknown or the helper call fails.
pub fn set_default_audio(state: &mut State, id: &str) -> Result<()> {
    state
        .set_default_audio(id)
        .with_context(|| format!("failed to set default audio device '{id}'"))?;

    println!("{} {}", "Default:".success(), id.bold());
    Ok(())
}

/// Enable or disable an audio endpoint.
///
/// # Errors
/// Returns an error if the id is unknown, the platform lacks the capability,
/// or the helper call fails.
pub fn set_audio_enabled(state: &mut State, id: &str, enable: bool) -> Result<()> {
    let verb = if enable { "enable" } else { "disable" };
    state
        .set_audio_enabled(id, enable)
        .with_context(|| format!("failed to {verb} audio device '{id}'"))?;

    let prefix = if enable { "Enabled:" } else { "Disabled:" };
    println!("{} {}", prefix.success(), id.bold());
    Ok(())
}

// ============================================================================
// Overlay Commands
// ============================================================================

/// Set or clear a monitor nickname. An omitted nickname clears it.
///
/// # Errors
/// Returns an error if persistence fails.
pub fn nickname_monitor(state: &mut State, handle: &str, nickname: Option<&str>) -> Result<()> {
    let nickname = nickname.unwrap_or("");
    state
        .set_monitor_nickname(handle, nickname)
        .with_context(|| format!("failed to update nickname for monitor '{handle}'"))?;

    if nickname.is_empty() {
        println!("{} {}", "Cleared nickname:".success(), handle.bold());
    } else {
        println!(
            "{} {} {} {}",
            "Nicknamed:".success(),
            handle.bold(),
            "as".dim(),
            nickname.bold()
        );
    }
    Ok(())
}

/// Set or clear an audio device nickname. An omitted nickname clears it.
///
/// # Errors
/// Returns an error if persistence fails.
pub fn nickname_audio(state: &mut State, id: &str, nickname: Option<&str>) -> Result<()> {
    let nickname = nickname.unwrap_or("");
    state
        .set_audio_nickname(id, nickname)
        .with_context(|| format!("failed to update nickname for audio device '{id}'"))?;

    if nickname.is_empty() {
        println!("{} {}", "Cleared nickname:".success(), id.bold());
    } else {
        println!(
            "{} {} {} {}",
            "Nicknamed:".success(),
            id.bold(),
            "as".dim(),
            nickname.bold()
        );
    }
    Ok(())
}

/// Hide an audio device from the default view.
///
/// # Errors
/// Returns an error if the id is already ignored or persistence fails.
pub fn ignore(state: &mut State, id: &str) -> Result<()> {
    state
        .ignore_audio_device(id)
        .with_context(|| format!("failed to ignore audio device '{id}'"))?;

    println!("{} {}", "Ignored:".success(), id.bold());
    Ok(())
}

/// Restore an ignored audio device to the default view.
///
/// # Errors
/// Returns an error if the id is not ignored or persistence fails.
pub fn unignore(state: &mut State, id: &str) -> Result<()> {
    state
        .unignore_audio_device(id)
        .with_context(|| format!("failed to unignore audio device '{id}'"))?;

    println!("{} {}", "Restored:".success(), id.bold());
    Ok(())
}

// ============================================================================
// Rendering Helpers
// ============================================================================

fn label(name: &str, nickname: Option<&str>) -> String {
    match nickname {
        Some(nick) => format!("{nick} ({name})"),
        None => name.to_string(),
    }
}

fn print_monitor_section(monitors: &[Monitor]) {
    println!("{}", "MONITORS:".header());
    println!("{}", "-".repeat(9));
    if monitors.is_empty() {
        println!("  {}", "(none detected)".dim());
        return;
    }
    for monitor in monitors {
        let marker = if monitor.is_primary { "* " } else { "  " };
        let status = if monitor.is_active {
            "active".success().to_string()
        } else {
            "inactive".warning().to_string()
        };
        println!(
            "{}{} - {}",
            marker,
            monitor.device_handle.as_str().bold(),
            status
        );
        println!(
            "    {}",
            label(&monitor.display_name, monitor.nickname.as_deref()).dim()
        );
        if monitor.is_active && !monitor.bounds.is_zero() {
            println!(
                "    {}",
                format!(
                    "{}x{} at ({}, {})",
                    monitor.bounds.width, monitor.bounds.height, monitor.bounds.x, monitor.bounds.y
                )
                .technical()
            );
        }
    }
    println!("\n  {} = primary", "*".dim());
}

fn print_audio_section(devices: &[&AudioDevice], ignored_count: usize) {
    println!("{}", "AUDIO DEVICES:".header());
    println!("{}", "-".repeat(14));
    if devices.is_empty() {
        println!("  {}", "(none detected)".dim());
    } else {
        for device in devices {
            print_audio_line(device);
        }
        println!("\n  {} = default for its type", "*".dim());
    }
    if ignored_count > 0 {
        println!(
            "  {}",
            format!("({ignored_count} ignored, use --all to show)").dim()
        );
    }
}

fn print_audio_line(device: &AudioDevice) {
    let marker = if device.is_default { "* " } else { "  " };
    let direction = match device.device_type {
        DeviceType::Output => "out",
        DeviceType::Input => "in ",
    };
    let status = match device.state {
        DeviceState::Active => "active".success().to_string(),
        DeviceState::Disabled => "disabled".warning().to_string(),
        DeviceState::Unplugged => "unplugged".warning().to_string(),
        DeviceState::NotPresent => "not present".error().to_string(),
    };
    println!(
        "{}[{}] {} - {}",
        marker,
        direction.dim(),
        label(&device.name, device.nickname.as_deref()).bold(),
        status
    );
    println!("    {}", device.id.as_str().technical());
}
