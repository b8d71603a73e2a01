// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dummybox_core::workload::worker_count;
use dummybox_core::{
    CpuRunner, CpuWorkload, JobRegistry, KillSwitch, LogRunner, LogSink, MemoryStore,
    PrimeWorkload, TracingSink,
};

use crate::config::Config;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Wall-clock start time, reported by /info.
    pub started_at: DateTime<Utc>,
    pub config: Config,
    /// Every live background job, keyed by job key.
    pub jobs: Arc<JobRegistry>,
    pub cpu: CpuRunner,
    pub memory: Arc<MemoryStore>,
    pub logs: LogRunner,
    pub kill: Arc<KillSwitch>,
}

impl AppState {
    /// Production state: generated logs go to `tracing`, CPU jobs count primes
    /// on every hardware thread.
    pub fn new(config: Config) -> Arc<Self> {
        Self::new_with_workloads(
            config,
            Arc::new(TracingSink),
            Arc::new(PrimeWorkload),
            worker_count(),
        )
    }

    /// Create with caller-provided log sink and CPU workload (for testing).
    pub fn new_with_workloads(
        config: Config,
        sink: Arc<dyn LogSink>,
        workload: Arc<dyn CpuWorkload>,
        workers: usize,
    ) -> Arc<Self> {
        let jobs = Arc::new(JobRegistry::new());
        Arc::new(Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            cpu: CpuRunner::with_workload(Arc::clone(&jobs), workload, workers),
            memory: Arc::new(MemoryStore::new(Arc::clone(&jobs))),
            logs: LogRunner::new(Arc::clone(&jobs), sink),
            kill: Arc::new(KillSwitch::new(config.kill_dry_run)),
            jobs,
            config,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Stop every background job. Called on shutdown.
    pub fn shutdown(&self) -> usize {
        self.jobs.cancel_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wires_one_registry() {
        let state = AppState::new(Config::default());
        assert!(state.jobs.is_empty());
        assert!(state.cpu.workers() >= 1);
        assert!(!state.kill.is_dry_run());
        assert_eq!(state.shutdown(), 0);
    }
}
