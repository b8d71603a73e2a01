// crates/core/src/jobs/mod.rs
//! Background job lifecycle.
//!
//! Provides:
//! - `JobRegistry` — shared key → cancellation map every runner registers in
//! - `CpuRunner` — worker pool burning CPU per intensity tier
//! - `MemoryStore` — owned byte blocks held for a duration
//! - `LogRunner` — one-shot or interval log emission through a `LogSink`
//! - `KillSwitch` — delayed process termination

pub mod cpu;
pub mod kill;
pub mod log;
pub mod memory;
pub mod registry;
pub mod types;

pub use cpu::{CpuJob, CpuRunner};
pub use kill::{KillSwitch, SuppressedKills};
pub use log::{LogEntry, LogRunner, LogSink, MemorySink, TracingSink};
pub use memory::{MemoryHold, MemoryStats, MemoryStore};
pub use registry::{JobGuard, JobRegistry};
pub use types::{JobKind, JobOutcome, JobSummary};
