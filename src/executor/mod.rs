//! Probe tool execution boundary
//!
//! The engine never spawns smartctl directly; it goes through the
//! [`SmartctlExecutor`] port so the host agent's process-execution layer (or
//! a scripted mock in tests) can own the actual invocation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

pub mod mock;

pub use mock::ScriptedSmartctl;

/// Port for invoking the external diagnostics tool.
///
/// Implementations run the tool with the given argument list and return the
/// captured stdout. An `Err` means the tool could not run or its output could
/// not be captured; tool-level failures (bad device, unknown qualifier) are
/// reported inside the JSON body and are not an execution error.
#[async_trait]
pub trait SmartctlExecutor: Send + Sync {
    /// Run the probe tool and capture its stdout.
    async fn execute(&self, args: &[&str]) -> Result<Bytes>;
}

// =============================================================================
// System Adapter
// =============================================================================

/// Production adapter spawning the configured smartctl binary.
#[derive(Debug, Clone)]
pub struct SystemSmartctl {
    path: PathBuf,
}

impl SystemSmartctl {
    /// Create an adapter for the smartctl binary at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured binary path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SmartctlExecutor for SystemSmartctl {
    async fn execute(&self, args: &[&str]) -> Result<Bytes> {
        debug!(binary = %self.path.display(), ?args, "executing smartctl");

        // smartctl exits nonzero for plenty of benign conditions and still
        // prints a JSON body carrying its own exit_status field, so only a
        // spawn/capture failure counts as an execution error here.
        let output = Command::new(&self.path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::execution(format!("failed to run {}: {}", self.path.display(), e))
            })?;

        Ok(Bytes::from(output.stdout))
    }
}
