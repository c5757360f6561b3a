//! Device discovery and partitioning
//!
//! Discovery runs one unqualified scan for directly attached candidates plus
//! one qualified scan per configured RAID bus tag, then partitions the
//! result into the three pipeline inputs. Discovery is fail-fast: a failed
//! or malformed scan aborts the whole step with no partial list, because a
//! partial device inventory would silently under-report.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::device::{DeviceInfo, ScanReport};
use crate::error::Result;
use crate::executor::SmartctlExecutor;
use crate::raid::RaidType;

/// Discovered devices, split per probing pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePartition {
    /// Directly attached candidates, probed without a qualifier
    pub basic: Vec<DeviceInfo>,
    /// Recognized RAID-family candidates, resolved by trial probing
    pub raid: Vec<DeviceInfo>,
    /// Vendor-specific controller candidates carrying their own qualifier
    pub megaraid: Vec<DeviceInfo>,
}

impl DevicePartition {
    /// Total number of candidates across the three pipelines.
    pub fn len(&self) -> usize {
        self.basic.len() + self.raid.len() + self.megaraid.len()
    }

    /// Whether discovery produced no candidates at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Enumerates candidate devices through scan invocations.
pub struct DeviceScanner {
    executor: Arc<dyn SmartctlExecutor>,
    raid_scan_types: Vec<String>,
}

impl DeviceScanner {
    /// Create a scanner issuing one qualified scan per entry of
    /// `raid_scan_types` (e.g. `["sat"]`).
    pub fn new(executor: Arc<dyn SmartctlExecutor>, raid_scan_types: Vec<String>) -> Self {
        Self {
            executor,
            raid_scan_types,
        }
    }

    /// Run a single scan invocation and decode the device list.
    ///
    /// Entries without a name are discarded: every device handed to a
    /// pipeline carries a non-empty raw name.
    pub async fn scan_devices(&self, args: &[&str]) -> Result<Vec<DeviceInfo>> {
        let raw = self.executor.execute(args).await?;
        let report: ScanReport = serde_json::from_slice(&raw)?;

        let mut devices = Vec::with_capacity(report.devices.len());
        for mut device in report.devices {
            if device.name.is_empty() {
                warn!(?args, "scan reported a device without a name, skipping");
                continue;
            }

            device.raw_name = device.name.clone();
            devices.push(device);
        }

        Ok(devices)
    }

    /// Discover all candidate devices and partition them per pipeline.
    ///
    /// Fail-fast: any scan failure aborts the whole discovery step.
    #[instrument(skip(self))]
    pub async fn get_devices(&self) -> Result<DevicePartition> {
        let basic = self.scan_devices(&["--scan", "-j"]).await?;

        let mut raid_candidates = Vec::new();
        for bus_tag in &self.raid_scan_types {
            let scanned = self
                .scan_devices(&["--scan", "-d", bus_tag.as_str(), "-j"])
                .await?;
            raid_candidates.extend(scanned);
        }

        Ok(format_device_output(basic, raid_candidates))
    }
}

/// Partition raid candidates by controller family and deduplicate the basic
/// list against them.
///
/// A bus tag in the recognized RAID-family set goes to the raid pipeline,
/// anything else (e.g. `megaraid,N`) to the megaraid pipeline. A name that
/// shows up in both scans keeps only its raid/megaraid classification: the
/// qualified probe is the one that can actually address it.
pub fn format_device_output(
    basic: Vec<DeviceInfo>,
    raid_candidates: Vec<DeviceInfo>,
) -> DevicePartition {
    let basic = basic
        .into_iter()
        .filter(|device| {
            !raid_candidates
                .iter()
                .any(|candidate| candidate.raw_name == device.raw_name)
        })
        .collect();

    let mut raid = Vec::new();
    let mut megaraid = Vec::new();
    for candidate in raid_candidates {
        if RaidType::is_recognized_bus(&candidate.dev_type) {
            raid.push(candidate);
        } else {
            megaraid.push(candidate);
        }
    }

    DevicePartition {
        basic,
        raid,
        megaraid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScriptedSmartctl;
    use assert_matches::assert_matches;
    use crate::error::Error;

    const BASIC_SCAN_BODY: &[u8] = br#"{
        "json_format_version": [1, 0],
        "smartctl": {"version": [7, 3], "exit_status": 0},
        "devices": [
            {"name": "/dev/csmi0,0", "info_name": "/dev/csmi0,0", "type": "ata", "protocol": "ATA"},
            {"name": "/dev/csmi0,2", "info_name": "/dev/csmi0,2", "type": "ata", "protocol": "ATA"},
            {"name": "/dev/sda", "info_name": "/dev/sda", "type": "scsi", "protocol": "SCSI"}
        ]
    }"#;

    const SAT_SCAN_BODY: &[u8] = br#"{
        "json_format_version": [1, 0],
        "smartctl": {"version": [7, 3], "exit_status": 0},
        "devices": [
            {"name": "/dev/sda", "info_name": "/dev/sda [SAT]", "type": "sat", "protocol": "ATA"},
            {"name": "/dev/bus/0", "info_name": "/dev/bus/0", "type": "megaraid,24", "protocol": "SCSI"}
        ]
    }"#;

    fn device(name: &str, info_name: &str, dev_type: &str) -> DeviceInfo {
        DeviceInfo {
            name: name.into(),
            info_name: info_name.into(),
            dev_type: dev_type.into(),
            raw_name: name.into(),
            raid_type: None,
        }
    }

    fn scanner(mock: ScriptedSmartctl, raid_scan_types: &[&str]) -> DeviceScanner {
        DeviceScanner::new(
            Arc::new(mock),
            raid_scan_types.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_scan_devices() {
        let mock = ScriptedSmartctl::new();
        mock.expect_output(&["--scan", "-j"], BASIC_SCAN_BODY);
        let scanner = scanner(mock, &["sat"]);

        let devices = scanner.scan_devices(&["--scan", "-j"]).await.unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].raw_name, "/dev/csmi0,0");
        assert_eq!(devices[0].dev_type, "ata");
        assert_eq!(devices[2].raw_name, "/dev/sda");
    }

    #[tokio::test]
    async fn test_scan_devices_execution_failure() {
        let mock = ScriptedSmartctl::new();
        mock.expect_failure(&["--scan", "-j"], "fail");
        let scanner = scanner(mock, &["sat"]);

        let err = scanner.scan_devices(&["--scan", "-j"]).await.unwrap_err();
        assert_matches!(err, Error::Execution(_));
    }

    #[tokio::test]
    async fn test_scan_devices_malformed_body() {
        let mock = ScriptedSmartctl::new();
        mock.expect_output(&["--scan", "-j"], b"{");
        let scanner = scanner(mock, &["sat"]);

        let err = scanner.scan_devices(&["--scan", "-j"]).await.unwrap_err();
        assert_matches!(err, Error::Parse(_));
    }

    #[tokio::test]
    async fn test_scan_devices_skips_nameless_entries() {
        let body = br#"{"devices": [
            {"name": "", "info_name": "ghost", "type": "ata"},
            {"name": "/dev/sdb", "info_name": "/dev/sdb", "type": "scsi"}
        ]}"#;

        let mock = ScriptedSmartctl::new();
        mock.expect_output(&["--scan", "-j"], body);
        let scanner = scanner(mock, &["sat"]);

        let devices = scanner.scan_devices(&["--scan", "-j"]).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].raw_name, "/dev/sdb");
    }

    #[tokio::test]
    async fn test_get_devices_partitions_and_dedupes() {
        let mock = ScriptedSmartctl::new();
        mock.expect_output(&["--scan", "-j"], BASIC_SCAN_BODY)
            .expect_output(&["--scan", "-d", "sat", "-j"], SAT_SCAN_BODY);
        let scanner = scanner(mock, &["sat"]);

        let partition = scanner.get_devices().await.unwrap();

        // /dev/sda was reported by both scans; the raid classification wins.
        assert_eq!(
            partition.basic,
            vec![
                device("/dev/csmi0,0", "/dev/csmi0,0", "ata"),
                device("/dev/csmi0,2", "/dev/csmi0,2", "ata"),
            ]
        );
        assert_eq!(
            partition.raid,
            vec![device("/dev/sda", "/dev/sda [SAT]", "sat")]
        );
        assert_eq!(
            partition.megaraid,
            vec![device("/dev/bus/0", "/dev/bus/0", "megaraid,24")]
        );
        assert_eq!(partition.len(), 4);
    }

    #[tokio::test]
    async fn test_get_devices_fail_fast_on_raid_scan() {
        let mock = ScriptedSmartctl::new();
        mock.expect_output(&["--scan", "-j"], BASIC_SCAN_BODY)
            .expect_failure(&["--scan", "-d", "sat", "-j"], "fail");
        let scanner = scanner(mock, &["sat"]);

        let err = scanner.get_devices().await.unwrap_err();
        assert_matches!(err, Error::Execution(_));
    }

    #[tokio::test]
    async fn test_get_devices_multiple_raid_scan_types() {
        let mock = ScriptedSmartctl::new();
        mock.expect_output(&["--scan", "-j"], br#"{"devices": []}"#)
            .expect_output(&["--scan", "-d", "sat", "-j"], SAT_SCAN_BODY)
            .expect_output(&["--scan", "-d", "nvme", "-j"], br#"{"devices": []}"#);
        let scanner = scanner(mock, &["sat", "nvme"]);

        let partition = scanner.get_devices().await.unwrap();
        assert_eq!(partition.raid.len(), 1);
        assert_eq!(partition.megaraid.len(), 1);
        assert!(partition.basic.is_empty());
    }

    #[test]
    fn test_format_device_output_partitions_by_family() {
        let basic = vec![
            device("/dev/csmi0,0", "/dev/csmi0,0", "ata"),
            device("/dev/csmi0,2", "/dev/csmi0,2", "ata"),
        ];
        let raid = vec![
            device("/dev/sda", "/dev/sda [SAT]", "sat"),
            device("/dev/sdb", "/dev/sdb [SAT]", "sat"),
            device("frogs_hallucination", "frogs_hallucination", "megaraid"),
            device("cows_imagination", "cows_imagination", "megaraid"),
        ];

        let partition = format_device_output(basic.clone(), raid);
        assert_eq!(partition.basic, basic);
        assert_eq!(partition.raid.len(), 2);
        assert_eq!(partition.megaraid.len(), 2);
        assert_eq!(partition.megaraid[0].raw_name, "frogs_hallucination");
    }

    #[test]
    fn test_format_device_output_raid_wins_duplicates() {
        let shared = device("/dev/sda", "/dev/sda [SAT]", "sat");
        let basic = vec![device("/dev/csmi0,0", "/dev/csmi0,0", "ata"), shared.clone()];
        let raid = vec![shared, device("/dev/sdb", "/dev/sdb [SAT]", "sat")];

        let partition = format_device_output(basic, raid);
        assert_eq!(partition.basic.len(), 1);
        assert_eq!(partition.basic[0].raw_name, "/dev/csmi0,0");
        assert_eq!(partition.raid.len(), 2);
        assert!(partition.megaraid.is_empty());
    }

    #[test]
    fn test_format_device_output_empty() {
        let partition = format_device_output(vec![], vec![]);
        assert!(partition.is_empty());
    }
}
