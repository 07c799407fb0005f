//! `devprof` - Device Profile Manager
//!
//! Captures the machine's monitor layout and audio-endpoint configuration as
//! named profiles and re-applies them on demand. Device access goes through
//! injected provider adapters that drive external helper tools, so the core
//! model and reconciliation logic stay platform-neutral and testable.
//!
//! # Features
//! - Enumerate display devices (active, inactive, disconnected) and audio
//!   endpoints (outputs and inputs)
//! - Save and re-apply named profiles: monitor topology plus audio defaults
//! - Nickname overlay for friendly device labels, keyed by stable id
//! - Ignore list to hide audio devices without losing them from enumeration
//! - JSON persistence under `~/.devprof` with atomic writes

pub mod cli;
pub mod commands;
pub mod device;
pub mod error;
pub mod logging;
pub mod provider;
pub mod state;
pub mod store;
pub mod style;

// Re-export commonly used types for convenience
pub use cli::Args;
pub use device::{AudioDevice, Monitor, Profile};
pub use error::{Error, Result};
pub use state::State;
