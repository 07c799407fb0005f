//! Command-line interface definitions
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// devprof - Device Profile Manager
///
/// Capture and re-apply monitor and audio device arrangements as named
/// profiles.
#[derive(Parser)]
#[command(name = "devprof")]
#[command(version)]
#[command(about = "Capture and re-apply monitor and audio arrangements as named profiles")]
#[command(after_help = "\
BEHAVIOR:
  - Profiles snapshot the full monitor layout plus the audio devices you select
  - Applying a profile replays monitors first, then audio defaults and states
  - Ignored audio devices stay enumerated but are hidden from the default view
  - Nicknames are display-only labels keyed by stable device id

QUERY COMMANDS:
  devprof                       Overview of devices and saved profiles
  devprof list-monitors         List display devices (active and inactive)
  devprof list-audio            List audio endpoints (--all includes ignored)
  devprof profiles              List saved profiles

PROFILE COMMANDS:
  devprof save NAME --audio ID  Snapshot current state (repeat --audio per device)
  devprof apply NAME            Re-apply a saved profile
  devprof delete NAME           Delete a saved profile

DEVICE COMMANDS:
  devprof set-primary HANDLE    Make a monitor the primary display
  devprof set-default ID        Make an audio device the default for its type

HELPER TOOLS:
  Enumeration and control go through external helper executables, resolved
  from --tools-dir, then $DEVPROF_TOOLS_DIR, then PATH.

SETTINGS:
  Profiles and overlays live as JSON under ~/.devprof")]
pub struct Args {
    /// Directory containing the helper executables
    #[arg(long, value_name = "DIR", global = true)]
    pub tools_dir: Option<PathBuf>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a file in the settings directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Command {
    /// List display devices, including inactive and disconnected ones
    ListMonitors {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List audio endpoints (outputs and inputs)
    ListAudio {
        /// Include ignored devices
        #[arg(long)]
        all: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List saved profiles
    Profiles {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Save the current arrangement as a named profile
    Save {
        /// Profile name (must not already exist)
        name: String,

        /// Audio device id to include (repeatable)
        #[arg(long = "audio", value_name = "ID")]
        audio: Vec<String>,
    },

    /// Apply a saved profile
    Apply {
        /// Profile name (exact match)
        name: String,
    },

    /// Delete a saved profile
    Delete {
        /// Profile name (exact match)
        name: String,
    },

    /// Make a monitor the primary display
    SetPrimary {
        /// OS device handle (see list-monitors)
        handle: String,
    },

    /// Activate a monitor
    Activate {
        /// OS device handle
        handle: String,
    },

    /// Deactivate a monitor (the primary must be demoted first)
    Deactivate {
        /// OS device handle
        handle: String,
    },

    /// Make an audio device the default for its type
    SetDefault {
        /// Audio device id (see list-audio)
        id: String,
    },

    /// Enable an audio endpoint
    EnableAudio {
        /// Audio device id
        id: String,
    },

    /// Disable an audio endpoint
    DisableAudio {
        /// Audio device id
        id: String,
    },

    /// Set or clear a display nickname for a device
    #[command(subcommand)]
    Nickname(NicknameTarget),

    /// Hide an audio device from the default view
    Ignore {
        /// Audio device id
        id: String,
    },

    /// Restore an ignored audio device to the default view
    Unignore {
        /// Audio device id
        id: String,
    },
}

/// Which device class a nickname applies to
#[derive(Subcommand)]
pub enum NicknameTarget {
    /// Nickname a monitor by device handle
    Monitor {
        /// OS device handle
        handle: String,

        /// Nickname to set (omit to clear)
        nickname: Option<String>,
    },

    /// Nickname an audio device by id
    Audio {
        /// Audio device id
        id: String,

        /// Nickname to set (omit to clear)
        nickname: Option<String>,
    },
}
