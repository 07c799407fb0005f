//! Core error taxonomy
//!
//! Every fallible core operation returns one of these kinds so callers can
//! distinguish lookup misses, duplicate adds, platform gaps, and the several
//! display-change outcomes without string matching.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Device or profile lookup miss.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempt to create something under a name that is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Attempt to ignore a device that is already on the ignore list.
    #[error("device is already ignored: {0}")]
    AlreadyIgnored(String),

    /// Attempt to unignore a device that is not on the ignore list.
    #[error("device is not in ignore list: {0}")]
    NotIgnored(String),

    /// Caller-supplied argument is invalid (empty profile name, etc.).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform or helper tool lacks this capability.
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// An OS call or helper-tool invocation failed outright.
    #[error("provider call failed: {message}")]
    Provider {
        message: String,
        /// Native status / exit code when the OS reported one.
        status: Option<i32>,
    },

    /// Soft outcome: the display change took effect but needs a reboot to
    /// fully apply. Callers treat this as a warning, not a failure.
    #[error("display change applied, but a restart is required")]
    RestartRequired,

    /// Hard display failure: the requested mode is not supported.
    #[error("display mode not supported")]
    BadMode,

    /// Hard display failure: invalid parameter or flags passed to the OS.
    #[error("invalid display parameter")]
    BadParameter,

    /// Hard display failure: settings could not be written to the registry.
    #[error("display settings could not be written to the registry")]
    NotUpdated,

    /// I/O on a persisted file (profiles, overlays, ignore list).
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A persisted document could not be serialized or parsed.
    #[error("storage serialization error: {0}")]
    StorageFormat(#[from] serde_json::Error),

    /// A profile apply aborted mid-way; carries which step failed.
    #[error("apply step '{step}' failed: {source}")]
    ApplyStep {
        step: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Convenience constructor for provider failures without a native status.
    pub fn provider(message: impl Into<String>) -> Self {
        Error::Provider {
            message: message.into(),
            status: None,
        }
    }

    /// True for the soft restart-required outcome, which callers log and
    /// otherwise treat as success.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::RestartRequired)
    }

    /// Wrap this error with the apply step that produced it.
    #[must_use]
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Error::ApplyStep {
            step: step.into(),
            source: Box::new(self),
        }
    }
}
