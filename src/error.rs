//! Error types for the smartscan plugin core

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering and probing storage devices
#[derive(Error, Debug)]
pub enum Error {
    /// smartctl could not be executed or its output stream failed
    #[error("smartctl execution failed: {0}")]
    Execution(String),

    /// smartctl produced a malformed JSON response
    #[error("failed to parse smartctl response: {0}")]
    Parse(#[from] serde_json::Error),

    /// smartctl could not determine SMART support for the device
    /// (no `smart_status` block in the response)
    #[error("SMART data unavailable for device: {device}")]
    UnsupportedDevice { device: String },

    /// Device-level error reported by smartctl through its exit status
    /// and message list
    #[error("{0}")]
    DeviceHealth(String),

    /// Installed smartctl is below the minimum supported version
    #[error("unsupported smartctl version {found}, 7.1 or newer is required")]
    UnsupportedVersion { found: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an execution error.
    pub(crate) fn execution(msg: impl Into<String>) -> Self {
        Error::Execution(msg.into())
    }

    /// Whether this error aborts the enclosing pipeline (as opposed to an
    /// entry-scoped error that is absorbed at the single-device level).
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Execution(_)
            | Error::Parse(_)
            | Error::UnsupportedVersion { .. }
            | Error::Config(_)
            | Error::Internal(_) => true,
            Error::UnsupportedDevice { .. } | Error::DeviceHealth(_) => false,
        }
    }
}
