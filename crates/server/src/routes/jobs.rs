// crates/server/src/routes/jobs.rs
//! Introspection of live background jobs.
//!
//! - GET /jobs — registry snapshot plus CPU and memory details

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use dummybox_core::{CpuIntensity, JobKind, JobSummary, MemoryStats};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CpuStats {
    pub active_jobs: Vec<String>,
    pub total_jobs: usize,
    pub workers_per_job: usize,
    pub intensity_levels: Vec<&'static str>,
    pub default_intensity: &'static str,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobSummary>,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
}

/// GET /jobs — List every live job, sorted by key.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobsResponse> {
    let mut jobs = state.jobs.snapshot();
    jobs.sort_by(|a, b| a.key.cmp(&b.key));

    let active_cpu: Vec<String> = jobs
        .iter()
        .filter(|j| j.kind == JobKind::Cpu)
        .map(|j| j.key.clone())
        .collect();

    Json(JobsResponse {
        cpu: CpuStats {
            total_jobs: active_cpu.len(),
            active_jobs: active_cpu,
            workers_per_job: state.cpu.workers(),
            intensity_levels: CpuIntensity::ALL.iter().map(|i| i.as_str()).collect(),
            default_intensity: CpuIntensity::Medium.as_str(),
        },
        memory: state.memory.stats(),
        jobs,
    })
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/jobs", get(list_jobs))
}
