// crates/core/src/jobs/types.rs
//! Types for the background job system.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// What a registered job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Log,
    Cpu,
    Memory,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Log => "log",
            JobKind::Cpu => "cpu",
            JobKind::Memory => "memory",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a job left the `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Stopped through the registry before its timer fired.
    Cancelled,
    /// Its total-duration timer fired.
    Expired,
    /// One-shot work finished on its own.
    Completed,
}

impl JobOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            JobOutcome::Cancelled => "cancelled",
            JobOutcome::Expired => "expired",
            JobOutcome::Completed => "completed",
        }
    }
}

/// Point-in-time view of one live job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub key: String,
    pub kind: JobKind,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_serialize() {
        assert_eq!(serde_json::to_string(&JobKind::Memory).unwrap(), "\"memory\"");
        assert_eq!(JobKind::Cpu.to_string(), "cpu");
    }

    #[test]
    fn test_job_summary_serialize() {
        let summary = JobSummary {
            key: "cpu-job-1-20260205-120000".to_string(),
            kind: JobKind::Cpu,
            started_at: "2026-02-05T12:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["key"], "cpu-job-1-20260205-120000");
        assert_eq!(json["kind"], "cpu");
        assert_eq!(json["started_at"], "2026-02-05T12:00:00Z");
    }
}
