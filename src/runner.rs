//! Concurrent probing pipelines
//!
//! Three independent pipelines - base, raid, megaraid - each drain their own
//! device queue with a pool of workers. Workers accumulate results over
//! disjoint key subsets and the pipeline merges them after join, so the
//! result mappings themselves never need a lock; synchronization is limited
//! to queue draining, completion signaling and the bounded error conduit.
//!
//! Fatal failures (tool execution, malformed JSON) abort the owning pipeline:
//! the worker pushes the error into the conduit best-effort and cancels the
//! pipeline token so the remaining workers stop draining. Probes already
//! dispatched are not individually cancelled - the only blocking operation
//! here is the probe invocation itself, and an outer deadline is assumed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::config::ScanConfig;
use crate::device::{DeviceInfo, HealthRecord, RawRecord};
use crate::error::{Error, Result};
use crate::executor::SmartctlExecutor;
use crate::probe::{probe_device, ExitStatusPolicy, ProbeOutcome};
use crate::raid::resolve_raid_device;
use crate::scanner::DevicePartition;

// =============================================================================
// Results
// =============================================================================

/// The two result mappings of one collection cycle, keyed by composite
/// device key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanResults {
    /// Structured health records
    pub health: HashMap<String, HealthRecord>,

    /// Verbatim pass-through records
    pub raw: HashMap<String, RawRecord>,
}

impl ScanResults {
    /// Number of devices across both mappings.
    pub fn len(&self) -> usize {
        self.health.len() + self.raw.len()
    }

    /// Whether the cycle produced no records.
    pub fn is_empty(&self) -> bool {
        self.health.is_empty() && self.raw.is_empty()
    }

    fn merge(&mut self, other: ScanResults) {
        self.health.extend(other.health);
        self.raw.extend(other.raw);
    }
}

// =============================================================================
// Pipelines
// =============================================================================

/// Probing strategy applied by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineKind {
    /// Direct probe, no qualifier
    Base,
    /// Ordered qualifier trial
    Raid,
    /// Direct probe with the vendor-supplied qualifier
    MegaRaid,
}

impl PipelineKind {
    fn name(self) -> &'static str {
        match self {
            PipelineKind::Base => "base",
            PipelineKind::Raid => "raid",
            PipelineKind::MegaRaid => "megaraid",
        }
    }
}

/// The orchestration core: runs the three pipelines over a device partition
/// and aggregates their results.
pub struct ConcurrentRunner {
    executor: Arc<dyn SmartctlExecutor>,
    workers: usize,
    error_capacity: usize,
    policy: ExitStatusPolicy,
}

impl ConcurrentRunner {
    /// Create a runner sized from the configuration.
    pub fn new(executor: Arc<dyn SmartctlExecutor>, config: &ScanConfig) -> Self {
        Self {
            executor,
            workers: config.effective_workers(),
            error_capacity: config.error_channel_capacity,
            policy: config.exit_status_policy.clone(),
        }
    }

    /// Probe every discovered device and return the two result mappings.
    ///
    /// The caller sees either a complete pair of mappings or the first fatal
    /// pipeline error - never a partial result alongside an error.
    #[instrument(skip_all, fields(devices = partition.len(), raw_mode = raw_mode))]
    pub async fn run(&self, partition: DevicePartition, raw_mode: bool) -> Result<ScanResults> {
        let DevicePartition {
            basic,
            raid,
            megaraid,
        } = partition;

        let (base_results, raid_results, megaraid_results) = tokio::join!(
            self.run_pipeline(PipelineKind::Base, basic, raw_mode),
            self.run_pipeline(PipelineKind::Raid, raid, raw_mode),
            self.run_pipeline(PipelineKind::MegaRaid, megaraid, raw_mode),
        );

        let mut results = ScanResults::default();
        for pipeline_results in [base_results, raid_results, megaraid_results] {
            results.merge(pipeline_results?);
        }

        debug!(
            health = results.health.len(),
            raw = results.raw.len(),
            "collection cycle complete"
        );

        Ok(results)
    }

    /// Run one pipeline: fill the work queue, spawn the pool, join it and
    /// deliver either the merged results or the first fatal error.
    async fn run_pipeline(
        &self,
        kind: PipelineKind,
        devices: Vec<DeviceInfo>,
        raw_mode: bool,
    ) -> Result<ScanResults> {
        if devices.is_empty() {
            return Ok(ScanResults::default());
        }

        let (work_tx, work_rx) = mpsc::channel(devices.len());
        for device in devices {
            work_tx
                .send(device)
                .await
                .map_err(|e| Error::Internal(format!("failed to queue device: {}", e)))?;
        }
        drop(work_tx);
        let queue = Arc::new(Mutex::new(work_rx));

        let (error_tx, mut error_rx) = mpsc::channel::<Error>(self.error_capacity);
        let cancel = CancellationToken::new();

        let workers: Vec<_> = (0..self.workers)
            .map(|_| {
                let worker = Worker {
                    kind,
                    raw_mode,
                    executor: Arc::clone(&self.executor),
                    policy: self.policy.clone(),
                    queue: Arc::clone(&queue),
                    errors: error_tx.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(error_tx);

        let mut results = ScanResults::default();
        for joined in join_all(workers).await {
            match joined {
                Ok(partial) => results.merge(partial),
                Err(e) => {
                    return Err(Error::Internal(format!(
                        "{} pipeline worker failed: {}",
                        kind.name(),
                        e
                    )))
                }
            }
        }

        // All workers have exited, so the conduit is closed; a queued fatal
        // error wins over whatever partial results were accumulated.
        if let Some(err) = error_rx.recv().await {
            error!(pipeline = kind.name(), %err, "pipeline aborted");
            return Err(err);
        }

        Ok(results)
    }
}

// =============================================================================
// Workers
// =============================================================================

/// One worker unit of a pipeline pool.
struct Worker {
    kind: PipelineKind,
    raw_mode: bool,
    executor: Arc<dyn SmartctlExecutor>,
    policy: ExitStatusPolicy,
    queue: Arc<Mutex<mpsc::Receiver<DeviceInfo>>>,
    errors: mpsc::Sender<Error>,
    cancel: CancellationToken,
}

impl Worker {
    /// Drain the queue until it closes or the pipeline is cancelled,
    /// accumulating results for a disjoint subset of device keys.
    async fn run(self) -> ScanResults {
        let mut results = ScanResults::default();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let device = { self.queue.lock().await.recv().await };
            let Some(device) = device else {
                break;
            };

            match self.process(&device).await {
                Ok(Some(outcome)) => {
                    let key = outcome.record.device.key();
                    if self.raw_mode {
                        results.raw.insert(key, outcome.into_raw_record());
                    } else {
                        results.health.insert(key, outcome.record);
                    }
                }
                Ok(None) => {
                    // Entry-scoped: the device is dropped, the pipeline
                    // continues.
                }
                Err(err) => {
                    // Fatal: best-effort delivery - never block on a conduit
                    // whose consumer may already have stopped reading.
                    if self.errors.try_send(err).is_err() {
                        warn!(
                            pipeline = self.kind.name(),
                            "error conduit full or closed, dropping error"
                        );
                    }
                    self.cancel.cancel();
                    break;
                }
            }
        }

        results
    }

    /// Probe one device according to the pipeline strategy.
    ///
    /// `Ok(None)` is an entry-scoped drop; `Err` is fatal to the pipeline.
    async fn process(&self, device: &DeviceInfo) -> Result<Option<ProbeOutcome>> {
        match self.kind {
            PipelineKind::Base => {
                match probe_device(
                    self.executor.as_ref(),
                    &device.raw_name,
                    None,
                    &self.policy,
                )
                .await
                {
                    Ok(mut outcome) => {
                        attach_identity(device, None, &mut outcome);
                        Ok(Some(outcome))
                    }
                    Err(err) if !err.is_fatal() => {
                        debug!(device = %device.raw_name, %err, "skipping device");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
            PipelineKind::MegaRaid => {
                match probe_device(
                    self.executor.as_ref(),
                    &device.raw_name,
                    Some(&device.dev_type),
                    &self.policy,
                )
                .await
                {
                    Ok(mut outcome) => {
                        attach_identity(device, Some(&device.dev_type), &mut outcome);
                        Ok(Some(outcome))
                    }
                    Err(err) if !err.is_fatal() => {
                        debug!(device = %device.raw_name, %err, "skipping device");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
            PipelineKind::Raid => {
                match resolve_raid_device(self.executor.as_ref(), &device.raw_name, &self.policy)
                    .await?
                {
                    Some((raid_type, mut outcome)) => {
                        attach_identity(device, Some(raid_type.qualifier()), &mut outcome);
                        Ok(Some(outcome))
                    }
                    None => Ok(None),
                }
            }
        }
    }
}

/// Rewrite the record's device block with the scan identity and the resolved
/// qualifier. `info_name` and `dev_type` keep whatever the probe response
/// reported; the display name becomes the composite key.
fn attach_identity(scanned: &DeviceInfo, qualifier: Option<&str>, outcome: &mut ProbeOutcome) {
    let info = &mut outcome.record.device;
    info.raw_name = scanned.raw_name.clone();
    info.raid_type = qualifier.map(str::to_string);
    info.name = info.key();
}
