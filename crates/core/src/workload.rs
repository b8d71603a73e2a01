// crates/core/src/workload.rs
//! Workload generators: the raw CPU and memory consumers used by the runners.

use std::collections::TryReserveError;
use std::time::Duration;

use serde::Serialize;

use crate::params::CpuIntensity;

// ============================================================================
// CPU
// ============================================================================

/// Work characteristics of one CPU intensity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuProfile {
    /// Upper bound for one prime-counting pass.
    pub work_size: u64,
    /// How long a worker burns CPU before idling.
    #[serde(serialize_with = "as_millis")]
    pub work_duration: Duration,
    /// How long a worker idles between bursts; zero means no idle at all.
    #[serde(serialize_with = "as_millis")]
    pub sleep_duration: Duration,
    pub description: &'static str,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl CpuProfile {
    /// Static tier table.
    pub const fn for_intensity(intensity: CpuIntensity) -> Self {
        match intensity {
            CpuIntensity::Light => CpuProfile {
                work_size: 5_000,
                work_duration: Duration::from_millis(100),
                sleep_duration: Duration::from_millis(400),
                description: "Light CPU stress - minimal system impact",
            },
            CpuIntensity::Medium => CpuProfile {
                work_size: 15_000,
                work_duration: Duration::from_millis(250),
                sleep_duration: Duration::from_millis(250),
                description: "Medium CPU stress - moderate system load",
            },
            CpuIntensity::Heavy => CpuProfile {
                work_size: 30_000,
                work_duration: Duration::from_millis(400),
                sleep_duration: Duration::from_millis(100),
                description: "Heavy CPU stress - high system load",
            },
            CpuIntensity::Extreme => CpuProfile {
                work_size: 50_000,
                work_duration: Duration::from_millis(500),
                sleep_duration: Duration::ZERO,
                description: "Extreme CPU stress - maximum system load",
            },
        }
    }
}

/// Count primes in `2..=n` by trial division. Deliberately naive.
pub fn count_primes(n: u64) -> u64 {
    let mut count = 0;
    for i in 2..=n {
        let mut is_prime = true;
        let mut j = 2;
        while j * j <= i {
            if i % j == 0 {
                is_prime = false;
                break;
            }
            j += 1;
        }
        if is_prime {
            count += 1;
        }
    }
    count
}

/// The unit of work a CPU worker repeats. Swappable so tests can observe the
/// worker loop without saturating the machine.
pub trait CpuWorkload: Send + Sync + 'static {
    /// Perform one pass of CPU-bound work.
    fn burn(&self, work_size: u64) -> u64;

    /// Idle between bursts.
    fn idle(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Production workload: prime counting.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimeWorkload;

impl CpuWorkload for PrimeWorkload {
    fn burn(&self, work_size: u64) -> u64 {
        std::hint::black_box(count_primes(std::hint::black_box(work_size)))
    }
}

/// Number of workers a CPU job starts: one per hardware thread.
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// ============================================================================
// Memory
// ============================================================================

pub const MIB: usize = 1024 * 1024;

/// Allocations are split into chunks of this size; the last holds the remainder.
pub const CHUNK_BYTES: usize = 10 * MIB;

/// Owned byte buffers backing one memory hold.
#[derive(Debug, Default)]
pub struct MemoryBlock {
    chunks: Vec<Vec<u8>>,
}

impl MemoryBlock {
    /// Allocate and touch `size_mb` MiB. Fails instead of aborting when the
    /// allocator cannot satisfy the request.
    pub fn allocate(size_mb: u64) -> Result<Self, TryReserveError> {
        let total = usize::try_from(size_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(MIB);
        let full_chunks = total / CHUNK_BYTES;
        let remainder = total % CHUNK_BYTES;

        let mut chunks = Vec::new();
        chunks.try_reserve_exact(full_chunks + usize::from(remainder > 0))?;

        let sizes = std::iter::repeat(CHUNK_BYTES)
            .take(full_chunks)
            .chain((remainder > 0).then_some(remainder));
        for (index, len) in sizes.enumerate() {
            let mut chunk = Vec::new();
            chunk.try_reserve_exact(len)?;
            // Non-zero fill forces the pages to be committed.
            chunk.resize(len, (index as u8) | 1);
            chunks.push(chunk);
        }

        Ok(Self { chunks })
    }

    pub fn len_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn size_mb(&self) -> u64 {
        (self.len_bytes() / MIB) as u64
    }
}

/// Resident memory of this process in MiB, if the OS exposes it.
pub fn process_memory_mb() -> Option<f64> {
    use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    let bytes = sys.process(pid)?.memory();
    Some((bytes as f64 / MIB as f64 * 100.0).round() / 100.0)
}

/// User and group this process runs as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOwner {
    pub uid: Option<String>,
    pub gid: Option<String>,
}

pub fn process_owner() -> ProcessOwner {
    use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

    let Ok(pid) = sysinfo::get_current_pid() else {
        return ProcessOwner::default();
    };
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_user(UpdateKind::Always),
    );
    let Some(process) = sys.process(pid) else {
        return ProcessOwner::default();
    };
    ProcessOwner {
        uid: process.user_id().map(id_string),
        gid: process.group_id().as_ref().map(id_string),
    }
}

#[cfg(unix)]
fn id_string<T>(id: &T) -> String
where
    T: std::ops::Deref,
    T::Target: std::fmt::Display,
{
    (**id).to_string()
}

#[cfg(not(unix))]
fn id_string<T: std::fmt::Debug>(id: &T) -> String {
    format!("{id:?}")
}
