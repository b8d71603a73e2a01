// crates/core/src/error.rs
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors that prevent a background job from starting.
///
/// Once a job is running, failures are logged by the runner and never surface
/// to the caller.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to spawn CPU worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("failed to allocate {size_mb}MB: {source}")]
    Allocation {
        size_mb: u64,
        #[source]
        source: TryReserveError,
    },
}

impl JobError {
    pub fn allocation(size_mb: u64, source: TryReserveError) -> Self {
        Self::Allocation { size_mb, source }
    }

    /// Short description safe to return to HTTP callers.
    pub fn public_message(&self) -> &'static str {
        match self {
            JobError::WorkerSpawn(_) => "Failed to generate CPU load",
            JobError::Allocation { .. } => "Failed to allocate memory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_messages_hide_internals() {
        let err = JobError::WorkerSpawn(std::io::Error::other("thread limit"));
        assert_eq!(err.public_message(), "Failed to generate CPU load");
        assert!(err.to_string().contains("thread limit"));

        let source = Vec::<u8>::new().try_reserve_exact(usize::MAX).unwrap_err();
        let err = JobError::allocation(64, source);
        assert_eq!(err.public_message(), "Failed to allocate memory");
        assert!(err.to_string().starts_with("failed to allocate 64MB"));
    }
}
