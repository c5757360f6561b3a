//! Scripted executor for testing without smartctl
//!
//! Mirrors the expectation-queue style used by host-agent test harnesses:
//! each expectation pairs an exact argument list with a canned response (or
//! an execution failure). Use this for:
//!
//! - Unit and integration testing without smartctl installed
//! - Deterministic pipeline tests with fixture responses
//! - CI/CD pipelines

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::executor::SmartctlExecutor;

/// One scripted invocation.
#[derive(Debug, Clone)]
struct Expectation {
    args: Vec<String>,
    response: std::result::Result<Bytes, String>,
}

/// Scripted smartctl double.
///
/// Expectations are matched by argument list, not by arrival order, so
/// concurrent pipelines can drain them in any interleaving. An invocation
/// with no matching expectation returns an execution error naming the
/// unexpected argument list, which fails the test loudly.
#[derive(Debug, Default)]
pub struct ScriptedSmartctl {
    expectations: Mutex<VecDeque<Expectation>>,
}

impl ScriptedSmartctl {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect an invocation with `args`, answering with `output`.
    pub fn expect_output(&self, args: &[&str], output: &[u8]) -> &Self {
        self.expectations.lock().push_back(Expectation {
            args: args.iter().map(|a| a.to_string()).collect(),
            response: Ok(Bytes::copy_from_slice(output)),
        });
        self
    }

    /// Expect an invocation with `args`, answering with an execution failure.
    pub fn expect_failure(&self, args: &[&str], msg: &str) -> &Self {
        self.expectations.lock().push_back(Expectation {
            args: args.iter().map(|a| a.to_string()).collect(),
            response: Err(msg.to_string()),
        });
        self
    }

    /// Number of expectations not yet consumed. Tests assert this is zero.
    pub fn remaining(&self) -> usize {
        self.expectations.lock().len()
    }
}

#[async_trait]
impl SmartctlExecutor for ScriptedSmartctl {
    async fn execute(&self, args: &[&str]) -> Result<Bytes> {
        let mut expectations = self.expectations.lock();

        let position = expectations.iter().position(|e| e.args == args);
        let expectation = position
            .and_then(|position| expectations.remove(position))
            .ok_or_else(|| {
                Error::execution(format!("unexpected smartctl invocation: {:?}", args))
            })?;

        match expectation.response {
            Ok(output) => Ok(output),
            Err(msg) => Err(Error::execution(msg)),
        }
    }
}
