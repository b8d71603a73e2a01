// crates/server/src/routes/cpu.rs
//! CPU load endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dummybox_core::{CpuInput, CpuProfile};
use serde::Serialize;

use super::input::{Command, Format};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CpuResponse {
    pub intensity: String,
    pub duration: u64,
    pub job_key: String,
    pub workers: usize,
    pub description: String,
    pub config: CpuProfile,
    pub message: String,
}

/// GET|POST /cpu - Start a CPU load job and return immediately.
pub async fn generate_cpu_load(
    State(state): State<Arc<AppState>>,
    Command { input, format }: Command<CpuInput>,
) -> ApiResult<Response> {
    let params = input.validate();
    let job = state.cpu.start(params)?;

    let message = format!(
        "Generating {} CPU load for {} seconds",
        job.intensity, job.duration
    );
    Ok(match format {
        Format::Text => format!(
            "{message}\nJob key: {}\nWorkers: {}\nDescription: {}\n",
            job.job_key, job.workers, job.profile.description
        )
        .into_response(),
        Format::Json => Json(CpuResponse {
            intensity: job.intensity.to_string(),
            duration: job.duration,
            description: job.profile.description.to_string(),
            job_key: job.job_key,
            workers: job.workers,
            config: job.profile,
            message,
        })
        .into_response(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/cpu", get(generate_cpu_load).post(generate_cpu_load))
}
