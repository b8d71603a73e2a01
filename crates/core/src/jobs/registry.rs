// crates/core/src/jobs/registry.rs
//! Shared registry of live background jobs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::types::{JobKind, JobSummary};

/// Cancellation capability for one live job.
struct JobHandle {
    kind: JobKind,
    token: CancellationToken,
    started_at: DateTime<Utc>,
}

/// Key → handle map shared by every runner.
///
/// A present key means exactly one live runner. Entries leave the map when the
/// runner finishes, when its timer fires, or when someone calls [`cancel`].
/// The lock is held only for the map operation itself; tokens are triggered
/// after it is released.
///
/// [`cancel`]: JobRegistry::cancel
pub struct JobRegistry {
    next_id: AtomicU64,
    jobs: Mutex<HashMap<String, JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a fresh key: `<kind>-job-<counter>-<YYYYMMDD-HHMMSS>`.
    pub fn next_key(&self, kind: JobKind) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{kind}-job-{id}-{}", Utc::now().format("%Y%m%d-%H%M%S"))
    }

    /// Insert a handle. Last write wins.
    pub fn register(&self, key: &str, kind: JobKind, token: CancellationToken) {
        let handle = JobHandle {
            kind,
            token,
            started_at: Utc::now(),
        };
        let replaced = match self.jobs.lock() {
            Ok(mut jobs) => jobs.insert(key.to_string(), handle),
            Err(e) => {
                tracing::error!("Mutex poisoned registering job: {e}");
                return;
            }
        };
        if let Some(old) = replaced {
            tracing::warn!(job_key = key, "job key re-registered, previous handle dropped");
            active_gauge(old.kind).decrement(1.0);
        }
        active_gauge(kind).increment(1.0);
        tracing::debug!(job_key = key, kind = %kind, "job registered");
    }

    /// Drop an entry without triggering it. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.take(key).is_some()
    }

    /// Remove an entry and trigger its cancellation. No-op when absent.
    pub fn cancel(&self, key: &str) -> bool {
        match self.take(key) {
            Some(handle) => {
                handle.token.cancel();
                tracing::info!(job_key = key, kind = %handle.kind, "job cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every live job. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(String, JobHandle)> = match self.jobs.lock() {
            Ok(mut jobs) => jobs.drain().collect(),
            Err(e) => {
                tracing::error!("Mutex poisoned draining jobs: {e}");
                return 0;
            }
        };
        for (_, handle) in &drained {
            active_gauge(handle.kind).decrement(1.0);
            handle.token.cancel();
        }
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "cancelled all jobs");
        }
        drained.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        match self.jobs.lock() {
            Ok(jobs) => jobs.contains_key(key),
            Err(e) => {
                tracing::error!("Mutex poisoned reading jobs: {e}");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.jobs.lock() {
            Ok(jobs) => jobs.len(),
            Err(e) => {
                tracing::error!("Mutex poisoned reading jobs: {e}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live jobs, unordered.
    pub fn snapshot(&self) -> Vec<JobSummary> {
        match self.jobs.lock() {
            Ok(jobs) => jobs
                .iter()
                .map(|(key, handle)| JobSummary {
                    key: key.clone(),
                    kind: handle.kind,
                    started_at: handle.started_at,
                })
                .collect(),
            Err(e) => {
                tracing::error!("Mutex poisoned reading jobs: {e}");
                Vec::new()
            }
        }
    }

    fn take(&self, key: &str) -> Option<JobHandle> {
        let handle = match self.jobs.lock() {
            Ok(mut jobs) => jobs.remove(key),
            Err(e) => {
                tracing::error!("Mutex poisoned removing job: {e}");
                None
            }
        }?;
        active_gauge(handle.kind).decrement(1.0);
        Some(handle)
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn active_gauge(kind: JobKind) -> metrics::Gauge {
    metrics::gauge!("dummybox_active_jobs", "kind" => kind.as_str())
}

/// Removes a job's registry entry when the runner task ends, whichever way
/// it ends.
pub struct JobGuard {
    registry: Arc<JobRegistry>,
    key: String,
}

impl JobGuard {
    pub fn new(registry: Arc<JobRegistry>, key: impl Into<String>) -> Self {
        Self {
            registry,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keys_are_unique_and_prefixed() {
        let registry = JobRegistry::new();
        let a = registry.next_key(JobKind::Cpu);
        let b = registry.next_key(JobKind::Cpu);
        let c = registry.next_key(JobKind::Memory);
        assert_ne!(a, b);
        assert!(a.starts_with("cpu-job-1-"), "{a}");
        assert!(b.starts_with("cpu-job-2-"), "{b}");
        assert!(c.starts_with("memory-job-3-"), "{c}");
    }

    #[test]
    fn test_register_and_cancel() {
        let registry = JobRegistry::new();
        let token = CancellationToken::new();
        registry.register("k1", JobKind::Log, token.clone());
        assert!(registry.contains("k1"));

        assert!(registry.cancel("k1"));
        assert!(token.is_cancelled());
        assert!(!registry.contains("k1"));

        // Second cancel is a no-op.
        assert!(!registry.cancel("k1"));
    }

    #[test]
    fn test_remove_does_not_trigger_token() {
        let registry = JobRegistry::new();
        let token = CancellationToken::new();
        registry.register("k1", JobKind::Cpu, token.clone());
        assert!(registry.remove("k1"));
        assert!(!token.is_cancelled());
        assert!(!registry.remove("k1"));
    }

    #[test]
    fn test_last_write_wins() {
        let registry = JobRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        registry.register("k", JobKind::Cpu, first.clone());
        registry.register("k", JobKind::Memory, second.clone());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].kind, JobKind::Memory);

        registry.cancel("k");
        assert!(second.is_cancelled());
        assert!(!first.is_cancelled());
    }

    #[test]
    fn test_cancel_all() {
        let registry = JobRegistry::new();
        let tokens: Vec<_> = (0..3).map(|_| CancellationToken::new()).collect();
        for (i, token) in tokens.iter().enumerate() {
            registry.register(&format!("k{i}"), JobKind::Log, token.clone());
        }
        assert_eq!(registry.cancel_all(), 3);
        assert!(registry.is_empty());
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
        assert_eq!(registry.cancel_all(), 0);
    }

    #[test]
    fn test_snapshot() {
        let registry = JobRegistry::new();
        registry.register("a", JobKind::Cpu, CancellationToken::new());
        registry.register("b", JobKind::Memory, CancellationToken::new());
        let mut keys: Vec<_> = registry.snapshot().into_iter().map(|s| s.key).collect();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let registry = Arc::new(JobRegistry::new());
        registry.register("k", JobKind::Log, CancellationToken::new());
        {
            let guard = JobGuard::new(Arc::clone(&registry), "k");
            assert_eq!(guard.key(), "k");
        }
        assert!(!registry.contains("k"));
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(JobRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let key = registry.next_key(JobKind::Cpu);
                        registry.register(&key, JobKind::Cpu, CancellationToken::new());
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(registry.len(), 400);
    }
}
