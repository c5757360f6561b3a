//! smartctl version gating
//!
//! JSON output from smartctl is only reliable from 7.1 onwards, so every
//! collection cycle starts by validating the installed tool. The result is
//! cached on a refresh interval to keep the gate off the hot path.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::device::SmartctlInfo;
use crate::error::{Error, Result};
use crate::executor::SmartctlExecutor;

/// Minimum supported major version.
const MIN_MAJOR: i32 = 7;

/// Minimum supported minor version when the major equals [`MIN_MAJOR`].
const MIN_MINOR: i32 = 1;

/// How long a successful version check stays valid.
pub const DEFAULT_VERSION_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Payload of a `-j -V` invocation.
#[derive(Debug, Default, Deserialize)]
struct VersionReport {
    #[serde(default)]
    smartctl: SmartctlInfo,
}

/// Evaluate a parsed version sequence against the minimum supported version.
///
/// Succeeds iff the sequence is non-empty, the first component is at least 7
/// and, when it equals 7, the second component is at least 1 - so `[7, 0]`
/// fails while `[7, 1]`, `[8]` and `[7, 1, 2]` pass.
pub fn evaluate_version(digits: &[i32]) -> Result<()> {
    let supported = match digits {
        [] => false,
        [major, rest @ ..] => {
            *major > MIN_MAJOR
                || (*major == MIN_MAJOR && rest.first().copied().unwrap_or(-1) >= MIN_MINOR)
        }
    };

    if supported {
        Ok(())
    } else {
        let found = digits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Err(Error::UnsupportedVersion { found })
    }
}

// =============================================================================
// Version Gate
// =============================================================================

/// Caches and validates the installed tool's version.
///
/// The last-check timestamp is owned by the gate instance (and thereby by one
/// plugin instance), so concurrent instances never interfere with each
/// other's cache.
#[derive(Debug)]
pub struct VersionGate {
    refresh_interval: Duration,
    last_check: Mutex<Option<Instant>>,
}

impl Default for VersionGate {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_CHECK_INTERVAL)
    }
}

impl VersionGate {
    /// Create a gate with the given refresh interval.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            last_check: Mutex::new(None),
        }
    }

    /// Validate the installed tool version, probing at most once per refresh
    /// interval.
    ///
    /// On success the cached timestamp is updated. On any failure (execution,
    /// parse or version policy) the timestamp is left unchanged so the next
    /// call probes again.
    pub async fn check(&self, executor: &dyn SmartctlExecutor) -> Result<()> {
        if let Some(checked_at) = *self.last_check.lock() {
            if checked_at.elapsed() < self.refresh_interval {
                return Ok(());
            }
        }

        let raw = executor.execute(&["-j", "-V"]).await?;
        let report: VersionReport = serde_json::from_slice(&raw)?;

        evaluate_version(&report.smartctl.version)?;
        debug!(version = ?report.smartctl.version, "smartctl version accepted");

        *self.last_check.lock() = Some(Instant::now());

        Ok(())
    }
}
