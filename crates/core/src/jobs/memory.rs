// crates/core/src/jobs/memory.rs
//! Memory holds: owned byte blocks kept alive for a duration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::registry::{JobGuard, JobRegistry};
use super::types::{JobKind, JobOutcome};
use crate::error::JobError;
use crate::params::MemoryParams;
use crate::workload::{process_memory_mb, MemoryBlock, MIB};

/// A started memory hold, as reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryHold {
    pub allocation_key: String,
    pub size_mb: u64,
    pub duration: u64,
    pub current_heap_mb: f64,
}

/// Snapshot of everything currently held.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    /// Allocation key → size in MB.
    pub allocations: HashMap<String, u64>,
    pub active_allocations: usize,
    pub total_allocated_mb: u64,
    pub current_heap_mb: f64,
}

/// Allocation map with its own lock, separate from the job registry.
///
/// Every hold is registered as a memory job. With a duration the supervisor
/// releases it when the timer fires; without one it lives until the process
/// exits or the job is cancelled. Cancelling a memory job releases its block
/// immediately.
pub struct MemoryStore {
    registry: Arc<JobRegistry>,
    blocks: Mutex<HashMap<String, MemoryBlock>>,
}

impl MemoryStore {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self {
            registry,
            blocks: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate and hold in one step. The fill runs on the calling thread;
    /// async callers should run [`MemoryBlock::allocate`] on a blocking thread
    /// and pass the result to [`hold`](Self::hold) instead.
    pub fn allocate(self: &Arc<Self>, params: MemoryParams) -> Result<MemoryHold, JobError> {
        let block = MemoryBlock::allocate(params.size_mb).map_err(|e| {
            tracing::error!(size_mb = params.size_mb, "memory allocation failed: {e}");
            JobError::allocation(params.size_mb, e)
        })?;
        Ok(self.hold(block, params.duration))
    }

    /// Store an already-filled block and start its release timer.
    pub fn hold(self: &Arc<Self>, block: MemoryBlock, duration: u64) -> MemoryHold {
        let key = self.registry.next_key(JobKind::Memory);
        let size_mb = block.size_mb();
        let bytes = block.len_bytes();

        match self.blocks.lock() {
            Ok(mut blocks) => {
                blocks.insert(key.clone(), block);
            }
            Err(e) => tracing::error!("Mutex poisoned storing memory block: {e}"),
        }
        metrics::gauge!("dummybox_allocated_bytes").increment(bytes as f64);

        let token = CancellationToken::new();
        self.registry.register(&key, JobKind::Memory, token.clone());
        tracing::info!(allocation_key = %key, size_mb, duration, "memory allocated");

        let store = Arc::clone(self);
        let guard = JobGuard::new(Arc::clone(&self.registry), key.clone());
        tokio::spawn(async move {
            let outcome = if duration == 0 {
                token.cancelled().await;
                JobOutcome::Cancelled
            } else {
                tokio::select! {
                    _ = token.cancelled() => JobOutcome::Cancelled,
                    _ = tokio::time::sleep(Duration::from_secs(duration)) => JobOutcome::Expired,
                }
            };
            store.release(guard.key());
            tracing::info!(allocation_key = guard.key(), outcome = outcome.as_str(), "memory released");
        });

        MemoryHold {
            allocation_key: key,
            size_mb,
            duration,
            current_heap_mb: process_memory_mb().unwrap_or(0.0),
        }
    }

    /// Drop a block. Returns whether it was held.
    pub fn release(&self, key: &str) -> bool {
        let block = match self.blocks.lock() {
            Ok(mut blocks) => blocks.remove(key),
            Err(e) => {
                tracing::error!("Mutex poisoned releasing memory block: {e}");
                None
            }
        };
        match block {
            Some(block) => {
                metrics::gauge!("dummybox_allocated_bytes").decrement(block.len_bytes() as f64);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self.blocks.lock() {
            Ok(blocks) => blocks.contains_key(key),
            Err(e) => {
                tracing::error!("Mutex poisoned reading memory blocks: {e}");
                false
            }
        }
    }

    pub fn stats(&self) -> MemoryStats {
        let allocations: HashMap<String, u64> = match self.blocks.lock() {
            Ok(blocks) => blocks
                .iter()
                .map(|(key, block)| (key.clone(), (block.len_bytes() / MIB) as u64))
                .collect(),
            Err(e) => {
                tracing::error!("Mutex poisoned reading memory blocks: {e}");
                HashMap::new()
            }
        };
        MemoryStats {
            active_allocations: allocations.len(),
            total_allocated_mb: allocations.values().sum(),
            allocations,
            current_heap_mb: process_memory_mb().unwrap_or(0.0),
        }
    }
}
