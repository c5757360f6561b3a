//! Device records and smartctl response payloads
//!
//! The structures here mirror the subset of the smartctl JSON output that the
//! engine consumes. Everything else in a response is ignored by serde, and
//! absent fields fall back to defaults so partially populated responses from
//! exotic controllers still produce usable records.

use serde::{Deserialize, Serialize};

/// Recognized leading device-path prefix.
const DEV_PATH_PREFIX: &str = "/dev/";

/// Strip the recognized device-path prefix from a device name.
///
/// Returns the input unchanged when no prefix is present; empty input yields
/// empty output.
pub fn cut_prefix(path: &str) -> &str {
    path.strip_prefix(DEV_PATH_PREFIX).unwrap_or(path)
}

// =============================================================================
// Device Identity
// =============================================================================

/// A candidate device as reported by a scan, later enriched with the
/// qualifier resolved for it.
///
/// `raw_name` is the device path exactly as the OS reported it and is never
/// empty for a device that made it out of a scan. `name` is the display form:
/// for base devices it equals `raw_name`, for RAID-class devices it is the
/// composite key `"<raw_name> <qualifier>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Display name; composite key once a qualifier is resolved
    #[serde(default)]
    pub name: String,

    /// Human-readable form reported by the tool (e.g. `/dev/sda [SAT]`)
    #[serde(default)]
    pub info_name: String,

    /// Bus type tag (e.g. `sat`, `nvme`, `megaraid,0`)
    #[serde(rename = "type", default)]
    pub dev_type: String,

    /// Device path as reported by the OS
    #[serde(skip)]
    pub raw_name: String,

    /// Addressing qualifier, set once resolved for RAID-class devices
    #[serde(skip)]
    pub raid_type: Option<String>,
}

impl DeviceInfo {
    /// The composite identity key: `"<raw_name> <qualifier>"` when a
    /// qualifier is set, bare `raw_name` otherwise. Unique across the final
    /// result mappings.
    pub fn key(&self) -> String {
        match &self.raid_type {
            Some(raid_type) => format!("{} {}", self.raw_name, raid_type),
            None => self.raw_name.clone(),
        }
    }
}

/// Payload of a `--scan` invocation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScanReport {
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
}

// =============================================================================
// smartctl Response Blocks
// =============================================================================

/// The `smartctl` block present in every response: tool version, exit status
/// bitmask and accumulated messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartctlInfo {
    #[serde(default)]
    pub version: Vec<i32>,

    #[serde(default)]
    pub exit_status: i64,

    #[serde(default)]
    pub messages: Vec<ToolMessage>,
}

/// A single message emitted by the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    #[serde(default)]
    pub string: String,
}

/// The `smart_status` block. Its presence signals that the tool could
/// determine SMART support for the addressing mode used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartStatus {
    #[serde(default)]
    pub passed: bool,
}

/// One row of the vendor-specific SMART attribute table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub thresh: i64,
}

/// The `ata_smart_attributes` block, order-preserving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartAttributes {
    #[serde(default)]
    pub table: Vec<AttributeEntry>,
}

// =============================================================================
// Result Records
// =============================================================================

/// Structured health record parsed from a single probe response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    #[serde(default)]
    pub model_name: String,

    #[serde(default)]
    pub serial_number: String,

    #[serde(rename = "device", default)]
    pub device: DeviceInfo,

    #[serde(default)]
    pub smartctl: SmartctlInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_status: Option<SmartStatus>,

    #[serde(rename = "ata_smart_attributes", default)]
    pub attributes: SmartAttributes,

    /// Device-level error reported by the tool, attached in base/megaraid
    /// probing instead of dropping the record
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub health_error: Option<String>,
}

/// Pass-through record: the verbatim probe response plus the serial number
/// extracted from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub serial_number: String,
    pub json_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_prefix() {
        assert_eq!(cut_prefix("/dev/sda"), "sda");
        assert_eq!(cut_prefix("sda"), "sda");
        assert_eq!(cut_prefix(""), "");
    }

    #[test]
    fn test_composite_key() {
        let mut dev = DeviceInfo {
            raw_name: "/dev/sda".into(),
            ..Default::default()
        };
        assert_eq!(dev.key(), "/dev/sda");

        dev.raid_type = Some("sat".into());
        assert_eq!(dev.key(), "/dev/sda sat");

        dev.raid_type = Some("3ware,0".into());
        assert_eq!(dev.key(), "/dev/sda 3ware,0");
    }

    #[test]
    fn test_parse_scan_report() {
        let body = r#"{
            "devices": [
                {"name": "/dev/csmi0,0", "info_name": "/dev/csmi0,0", "type": "ata"},
                {"name": "/dev/sda", "info_name": "/dev/sda [SAT]", "type": "sat"}
            ]
        }"#;

        let report: ScanReport = serde_json::from_str(body).unwrap();
        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.devices[0].name, "/dev/csmi0,0");
        assert_eq!(report.devices[0].dev_type, "ata");
        assert_eq!(report.devices[1].info_name, "/dev/sda [SAT]");
    }

    #[test]
    fn test_parse_health_record() {
        let body = r#"{
            "json_format_version": [1, 0],
            "smartctl": {
                "version": [7, 3],
                "exit_status": 0,
                "messages": []
            },
            "device": {"name": "/dev/sda", "info_name": "/dev/sda [SAT]", "type": "sat"},
            "model_name": "INTEL SSDSC2BB120G6",
            "serial_number": "PHWA619301M9120CGN",
            "smart_status": {"passed": true},
            "ata_smart_attributes": {
                "table": [
                    {"name": "Reallocated_Sector_Ct", "id": 5, "thresh": 0},
                    {"name": "End-to-End_Error", "id": 184, "thresh": 90}
                ]
            }
        }"#;

        let record: HealthRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.model_name, "INTEL SSDSC2BB120G6");
        assert_eq!(record.serial_number, "PHWA619301M9120CGN");
        assert_eq!(record.smartctl.version, vec![7, 3]);
        assert_eq!(record.device.dev_type, "sat");
        assert!(record.smart_status.is_some());
        assert_eq!(record.attributes.table.len(), 2);
        assert_eq!(record.attributes.table[1].thresh, 90);
        assert!(record.health_error.is_none());
    }

    #[test]
    fn test_parse_tolerates_missing_blocks() {
        // A response with no smart_status and no attribute table still parses;
        // support classification happens later.
        let body = r#"{
            "smartctl": {"version": [7, 3], "exit_status": 0},
            "serial_number": "S5G1NC0W102239"
        }"#;

        let record: HealthRecord = serde_json::from_str(body).unwrap();
        assert!(record.smart_status.is_none());
        assert!(record.attributes.table.is_empty());
        assert!(record.device.name.is_empty());
    }
}
