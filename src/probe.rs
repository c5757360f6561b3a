//! Single-device probing and tool error classification
//!
//! A probe runs `smartctl -a <name> [-d <qualifier>] -j`, decodes the JSON
//! body into a [`HealthRecord`] and classifies the tool-level error signals
//! embedded in it. Execution and parse failures are fatal to the caller's
//! pipeline; a missing `smart_status` block or a device-level error from the
//! exit status are entry-scoped.

use bytes::Bytes;
use tracing::debug;

use crate::device::{HealthRecord, RawRecord};
use crate::error::{Error, Result};
use crate::executor::SmartctlExecutor;

/// Fallback error text for a failing exit status without messages.
pub const UNKNOWN_TOOL_ERROR: &str = "Unknown error from smartctl.";

// =============================================================================
// Exit Status Policy
// =============================================================================

/// Partition of smartctl exit-status values into failing and informational.
///
/// The split is inferred from observed tool behavior (statuses 1 and 2 are
/// hard failures, 3 is a warning that still carries messages, 4 is
/// informational), not from a documented contract, so it is kept as a
/// configurable table rather than hard-coded checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStatusPolicy {
    failing: Vec<i64>,
}

impl Default for ExitStatusPolicy {
    fn default() -> Self {
        Self {
            failing: vec![1, 2, 3],
        }
    }
}

impl ExitStatusPolicy {
    /// Create a policy with a custom set of failing statuses.
    pub fn new(failing: impl Into<Vec<i64>>) -> Self {
        Self {
            failing: failing.into(),
        }
    }

    /// Whether `status` indicates a device-level failure.
    pub fn is_failing(&self, status: i64) -> bool {
        self.failing.contains(&status)
    }
}

// =============================================================================
// Error Classification
// =============================================================================

impl HealthRecord {
    /// Interpret the exit status together with the message list.
    ///
    /// A failing status with messages yields the messages joined with `", "`,
    /// the first letter capitalized and a trailing period appended; a failing
    /// status without messages yields [`UNKNOWN_TOOL_ERROR`]. Any other
    /// status is clean regardless of messages.
    pub fn check_err(&self, policy: &ExitStatusPolicy) -> Result<()> {
        if !policy.is_failing(self.smartctl.exit_status) {
            return Ok(());
        }

        if self.smartctl.messages.is_empty() {
            return Err(Error::DeviceHealth(UNKNOWN_TOOL_ERROR.to_string()));
        }

        let combined = self
            .smartctl
            .messages
            .iter()
            .map(|m| m.string.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut chars = combined.chars();
        let mut message = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        message.push('.');

        Err(Error::DeviceHealth(message))
    }
}

// =============================================================================
// Probe Outcome
// =============================================================================

/// Result of one successful probe invocation: the parsed record (which may
/// carry a device-level health error) plus the verbatim response bytes for
/// pass-through mode.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub record: HealthRecord,
    pub raw: Bytes,
}

impl ProbeOutcome {
    /// The device-level error reported by the tool, if any.
    pub fn device_error(&self) -> Option<&str> {
        self.record.health_error.as_deref()
    }

    /// Convert into a pass-through record.
    pub fn into_raw_record(self) -> RawRecord {
        RawRecord {
            serial_number: self.record.serial_number,
            json_data: String::from_utf8_lossy(&self.raw).into_owned(),
        }
    }
}

/// Probe a single device.
///
/// Builds `[-a, <name>, -d, <qualifier>, -j]` (the `-d` pair is omitted for
/// unqualified basic probes) and decodes the response.
///
/// # Errors
///
/// - [`Error::Execution`] / [`Error::Parse`] - fatal to the enclosing
///   pipeline
/// - [`Error::UnsupportedDevice`] - the response carries no `smart_status`
///   block, so the tool could not determine support for this addressing
///   mode; entry-scoped
///
/// A device-level error from the exit status is not an `Err`: it is attached
/// to the record as `health_error` so callers can decide whether to keep the
/// record (base/megaraid probing) or fall through to the next qualifier
/// (raid trial probing).
pub async fn probe_device(
    executor: &dyn SmartctlExecutor,
    name: &str,
    raid_type: Option<&str>,
    policy: &ExitStatusPolicy,
) -> Result<ProbeOutcome> {
    let raw = match raid_type {
        Some(raid_type) => {
            executor
                .execute(&["-a", name, "-d", raid_type, "-j"])
                .await?
        }
        None => executor.execute(&["-a", name, "-j"]).await?,
    };

    let mut record: HealthRecord = serde_json::from_slice(&raw)?;

    if record.smart_status.is_none() {
        return Err(Error::UnsupportedDevice {
            device: name.to_string(),
        });
    }

    if let Err(Error::DeviceHealth(msg)) = record.check_err(policy) {
        debug!(device = name, error = %msg, "smartctl reported a device error");
        record.health_error = Some(msg);
    }

    Ok(ProbeOutcome { record, raw })
}
