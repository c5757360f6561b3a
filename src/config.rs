//! Scan configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::probe::ExitStatusPolicy;
use crate::version::DEFAULT_VERSION_CHECK_INTERVAL;

/// Bus tags scanned for RAID candidates when none are configured.
const DEFAULT_RAID_SCAN_TYPES: &[&str] = &["sat"];

/// Capacity of the per-pipeline fatal-error conduit.
const DEFAULT_ERROR_CHANNEL_CAPACITY: usize = 10;

/// Configuration for one plugin instance.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Path to the smartctl binary
    pub smartctl_path: PathBuf,

    /// Bus tags to scan for RAID candidates, one qualified scan each
    pub raid_scan_types: Vec<String>,

    /// Worker count per pipeline; `None` means the host logical-core count.
    /// Set explicitly for deterministic pipeline behavior under test.
    pub workers: Option<usize>,

    /// Capacity of the bounded fatal-error conduit per pipeline
    pub error_channel_capacity: usize,

    /// How long a successful version check stays valid
    pub version_check_interval: Duration,

    /// Partition of smartctl exit statuses into failing and informational
    pub exit_status_policy: ExitStatusPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            smartctl_path: PathBuf::from("smartctl"),
            raid_scan_types: DEFAULT_RAID_SCAN_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            workers: None,
            error_channel_capacity: DEFAULT_ERROR_CHANNEL_CAPACITY,
            version_check_interval: DEFAULT_VERSION_CHECK_INTERVAL,
            exit_status_policy: ExitStatusPolicy::default(),
        }
    }
}

impl ScanConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.smartctl_path.as_os_str().is_empty() {
            return Err(Error::Config("smartctl path must not be empty".into()));
        }

        if self.workers == Some(0) {
            return Err(Error::Config("worker count must be at least 1".into()));
        }

        if self.error_channel_capacity == 0 {
            return Err(Error::Config(
                "error channel capacity must be at least 1".into(),
            ));
        }

        if self.raid_scan_types.iter().any(|t| t.is_empty()) {
            return Err(Error::Config("raid scan types must not be empty".into()));
        }

        Ok(())
    }

    /// The worker count each pipeline runs with: the configured override, or
    /// the host logical-core count.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        })
    }
}
