//! RAID qualifier resolution by ordered trial probing
//!
//! Several HBA families answer a probe for the wrong controller type with a
//! benign, non-fatal response instead of a protocol error, so elimination
//! must walk a fixed order observed to avoid those false negatives. The
//! order is an explicit constant and the walk stops at the first accepted
//! qualifier; do not replace this with parallel speculative probing.

use tracing::debug;

use crate::error::{Error, Result};
use crate::executor::SmartctlExecutor;
use crate::probe::{probe_device, ExitStatusPolicy, ProbeOutcome};

/// Controller family used to address a device behind a RAID/HBA controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidType {
    ThreeWare,
    Areca,
    Cciss,
    Sat,
    Scsi,
}

/// Trial order for unresolved RAID candidates. Empirical; the families that
/// answer ambiguous requests benignly must be eliminated first.
pub const RAID_TRIAL_ORDER: [RaidType; 5] = [
    RaidType::ThreeWare,
    RaidType::Areca,
    RaidType::Cciss,
    RaidType::Sat,
    RaidType::Scsi,
];

impl RaidType {
    /// The `-d` qualifier for this family, including the controller-slot
    /// index where the family requires one.
    pub fn qualifier(self) -> &'static str {
        match self {
            RaidType::ThreeWare => "3ware,0",
            RaidType::Areca => "areca,1",
            RaidType::Cciss => "cciss,0",
            RaidType::Sat => "sat",
            RaidType::Scsi => "scsi",
        }
    }

    /// The bare bus tag as it appears in scan output.
    pub fn bus_tag(self) -> &'static str {
        match self {
            RaidType::ThreeWare => "3ware",
            RaidType::Areca => "areca",
            RaidType::Cciss => "cciss",
            RaidType::Sat => "sat",
            RaidType::Scsi => "scsi",
        }
    }

    /// Whether a scan-reported bus tag belongs to the recognized RAID-family
    /// set. Anything else (e.g. `megaraid,N`) is a vendor-specific controller
    /// family carrying its own qualifier.
    pub fn is_recognized_bus(tag: &str) -> bool {
        RAID_TRIAL_ORDER.iter().any(|t| t.bus_tag() == tag)
    }
}

impl std::fmt::Display for RaidType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualifier())
    }
}

/// Resolve the addressing qualifier for a RAID candidate by trial probing.
///
/// Walks [`RAID_TRIAL_ORDER`], accepting the first qualifier whose probe
/// yields neither a tool-level protocol/argument error nor an unsupported
/// response, and stops there. Returns `Ok(None)` when every qualifier is
/// rejected - an entry-scoped outcome; the device is dropped.
///
/// # Errors
///
/// Execution and parse failures are fatal and surface immediately.
pub async fn resolve_raid_device(
    executor: &dyn SmartctlExecutor,
    name: &str,
    policy: &ExitStatusPolicy,
) -> Result<Option<(RaidType, ProbeOutcome)>> {
    for raid_type in RAID_TRIAL_ORDER {
        match probe_device(executor, name, Some(raid_type.qualifier()), policy).await {
            Ok(outcome) => {
                if let Some(reason) = outcome.device_error() {
                    debug!(
                        device = name,
                        qualifier = %raid_type,
                        reason,
                        "qualifier rejected"
                    );
                    continue;
                }

                debug!(device = name, qualifier = %raid_type, "qualifier accepted");
                return Ok(Some((raid_type, outcome)));
            }
            Err(Error::UnsupportedDevice { .. }) => {
                debug!(device = name, qualifier = %raid_type, "no SMART support, qualifier rejected");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    debug!(device = name, "all qualifiers rejected, dropping device");
    Ok(None)
}
