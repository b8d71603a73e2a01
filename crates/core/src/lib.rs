// crates/core/src/lib.rs
pub mod error;
pub mod jobs;
pub mod messages;
pub mod params;
pub mod workload;

pub use error::*;
pub use jobs::*;
pub use params::*;
pub use workload::{CpuProfile, CpuWorkload, MemoryBlock, PrimeWorkload, ProcessOwner};
