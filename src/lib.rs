//! smartscan - Storage-Device Health Discovery & Probing Engine
//!
//! A plugin core for host monitoring agents that reports storage-device
//! health through an external `smartctl`-compatible diagnostics tool.
//! Devices may be attached directly, behind SATA/SCSI pass-throughs, or
//! behind hardware RAID/HBA controllers (3ware, Areca, CCISS, SAT, SCSI and
//! MegaRAID-class vendors), each requiring its own addressing qualifier.
//!
//! # Architecture
//!
//! ```text
//! VersionGate ──▶ DeviceScanner ──▶ partition ──▶ ConcurrentRunner
//!                                                ┌──────────────┐
//!                                   basic ──────▶│ worker pool  │
//!                                   raid ───────▶│ worker pool  │──▶ results
//!                                   megaraid ───▶│ worker pool  │
//!                                                └──────────────┘
//! ```
//!
//! Each collection cycle validates the installed tool version (cached on a
//! refresh interval), enumerates candidate devices, partitions them by
//! controller family, and probes them through three independent worker
//! pools. RAID candidates with an ambiguous controller are resolved by an
//! ordered qualifier trial. One bad device never fails a scan: entry-scoped
//! failures are absorbed per device, and only tool execution or JSON parse
//! failures abort a pipeline.
//!
//! # Example
//!
//! ```no_run
//! use smartscan::{ScanConfig, SmartScan};
//!
//! # async fn example() -> smartscan::Result<()> {
//! let plugin = SmartScan::from_config(ScanConfig::default())?;
//! let results = plugin.collect(false).await?;
//!
//! for (key, record) in &results.health {
//!     println!("{}: {} ({})", key, record.model_name, record.serial_number);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Plugin configuration
//! - [`device`] - Device records and smartctl payloads
//! - [`error`] - Error types
//! - [`executor`] - Probe tool execution boundary
//! - [`plugin`] - Plugin facade
//! - [`probe`] - Single-device probing and error classification
//! - [`raid`] - RAID qualifier resolution
//! - [`runner`] - Concurrent probing pipelines
//! - [`scanner`] - Device discovery and partitioning
//! - [`version`] - smartctl version gating

pub mod config;
pub mod device;
pub mod error;
pub mod executor;
pub mod plugin;
pub mod probe;
pub mod raid;
pub mod runner;
pub mod scanner;
pub mod version;

// Re-export commonly used types
pub use config::ScanConfig;
pub use device::{cut_prefix, DeviceInfo, HealthRecord, RawRecord};
pub use error::{Error, Result};
pub use executor::{ScriptedSmartctl, SmartctlExecutor, SystemSmartctl};
pub use plugin::SmartScan;
pub use probe::{ExitStatusPolicy, ProbeOutcome};
pub use raid::{RaidType, RAID_TRIAL_ORDER};
pub use runner::{ConcurrentRunner, ScanResults};
pub use scanner::{DevicePartition, DeviceScanner};
pub use version::{evaluate_version, VersionGate};
