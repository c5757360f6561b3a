//! Plugin facade
//!
//! One [`SmartScan`] value is one plugin instance: it owns the version-gate
//! cache and the configuration, and runs the scan-then-probe cycle on
//! demand. Each call to [`SmartScan::collect`] is a one-shot cycle; nothing
//! is persisted across calls except the version-check timestamp.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::executor::{SmartctlExecutor, SystemSmartctl};
use crate::runner::{ConcurrentRunner, ScanResults};
use crate::scanner::DeviceScanner;
use crate::version::VersionGate;

/// A storage-device health plugin instance.
pub struct SmartScan {
    executor: Arc<dyn SmartctlExecutor>,
    config: ScanConfig,
    version_gate: VersionGate,
}

impl std::fmt::Debug for SmartScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartScan")
            .field("config", &self.config)
            .field("version_gate", &self.version_gate)
            .finish_non_exhaustive()
    }
}

impl SmartScan {
    /// Create a plugin instance over the given executor.
    pub fn new(executor: Arc<dyn SmartctlExecutor>, config: ScanConfig) -> Result<Self> {
        config.validate()?;

        let version_gate = VersionGate::new(config.version_check_interval);

        Ok(Self {
            executor,
            config,
            version_gate,
        })
    }

    /// Create a plugin instance spawning the smartctl binary named by the
    /// configuration.
    pub fn from_config(config: ScanConfig) -> Result<Self> {
        let executor = Arc::new(SystemSmartctl::new(&config.smartctl_path));
        Self::new(executor, config)
    }

    /// The active configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one scan-then-probe cycle.
    ///
    /// With `raw_mode` set, records are collected verbatim instead of being
    /// parsed into structured health records.
    #[instrument(skip(self))]
    pub async fn collect(&self, raw_mode: bool) -> Result<ScanResults> {
        self.version_gate.check(self.executor.as_ref()).await?;

        let scanner = DeviceScanner::new(
            Arc::clone(&self.executor),
            self.config.raid_scan_types.clone(),
        );
        let partition = scanner.get_devices().await?;

        info!(
            basic = partition.basic.len(),
            raid = partition.raid.len(),
            megaraid = partition.megaraid.len(),
            "device discovery complete"
        );

        let runner = ConcurrentRunner::new(Arc::clone(&self.executor), &self.config);
        runner.run(partition, raw_mode).await
    }
}
