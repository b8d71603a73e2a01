// crates/core/src/jobs/cpu.rs
//! CPU load jobs: a pool of worker threads sharing one job key.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::registry::{JobGuard, JobRegistry};
use super::types::{JobKind, JobOutcome};
use crate::error::JobError;
use crate::params::{CpuIntensity, CpuParams};
use crate::workload::{worker_count, CpuProfile, CpuWorkload, PrimeWorkload};

/// A started CPU job, as reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct CpuJob {
    pub job_key: String,
    pub intensity: CpuIntensity,
    pub duration: u64,
    pub workers: usize,
    pub profile: CpuProfile,
}

/// Starts CPU jobs.
///
/// Workers are plain OS threads so a busy worker never starves the async
/// runtime. A small supervisor task owns the registry entry and the
/// total-duration timer.
pub struct CpuRunner {
    registry: Arc<JobRegistry>,
    workload: Arc<dyn CpuWorkload>,
    workers: usize,
}

impl CpuRunner {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self::with_workload(registry, Arc::new(PrimeWorkload), worker_count())
    }

    pub fn with_workload(registry: Arc<JobRegistry>, workload: Arc<dyn CpuWorkload>, workers: usize) -> Self {
        Self {
            registry,
            workload,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Spawn the workers and register the job.
    ///
    /// If any worker fails to spawn, the ones already running are stopped and
    /// nothing is registered.
    pub fn start(&self, params: CpuParams) -> Result<CpuJob, JobError> {
        let profile = CpuProfile::for_intensity(params.intensity);
        let key = self.registry.next_key(JobKind::Cpu);
        let token = CancellationToken::new();

        for index in 0..self.workers {
            let workload = Arc::clone(&self.workload);
            let worker_token = token.clone();
            let spawned = thread::Builder::new()
                .name(format!("cpu-worker-{index}"))
                .spawn(move || run_worker(workload.as_ref(), profile, &worker_token));
            if let Err(e) = spawned {
                token.cancel();
                tracing::error!(job_key = %key, worker = index, "failed to spawn CPU worker: {e}");
                return Err(JobError::WorkerSpawn(e));
            }
        }

        self.registry.register(&key, JobKind::Cpu, token.clone());
        tracing::info!(
            job_key = %key,
            intensity = %params.intensity,
            duration = params.duration,
            workers = self.workers,
            "CPU load started"
        );

        let guard = JobGuard::new(Arc::clone(&self.registry), key.clone());
        let total = Duration::from_secs(params.duration);
        tokio::spawn(async move {
            let outcome = if total.is_zero() {
                token.cancelled().await;
                JobOutcome::Cancelled
            } else {
                tokio::select! {
                    _ = token.cancelled() => JobOutcome::Cancelled,
                    _ = tokio::time::sleep(total) => {
                        token.cancel();
                        JobOutcome::Expired
                    }
                }
            };
            tracing::info!(job_key = guard.key(), outcome = outcome.as_str(), "CPU load stopped");
        });

        Ok(CpuJob {
            job_key: key,
            intensity: params.intensity,
            duration: params.duration,
            workers: self.workers,
            profile,
        })
    }
}

/// One worker's loop. Burns for `work_duration`, idles for `sleep_duration`,
/// and checks the token between passes. Returns the number of passes made.
pub(crate) fn run_worker(workload: &dyn CpuWorkload, profile: CpuProfile, token: &CancellationToken) -> u64 {
    let mut passes = 0u64;
    while !token.is_cancelled() {
        let burst_end = Instant::now() + profile.work_duration;
        while Instant::now() < burst_end && !token.is_cancelled() {
            workload.burn(profile.work_size);
            passes += 1;
        }
        if !profile.sleep_duration.is_zero() && !token.is_cancelled() {
            workload.idle(profile.sleep_duration);
        }
    }
    passes
}
