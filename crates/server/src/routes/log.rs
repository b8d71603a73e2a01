// crates/server/src/routes/log.rs
//! Log generation endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use dummybox_core::messages::resolve_message;
use dummybox_core::LogInput;
use dummybox_observability::CorrelationId;
use serde::Serialize;

use super::input::Command;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct LogResponse {
    pub level: String,
    pub size: String,
    pub message: String,
    pub interval: u64,
    pub duration: u64,
    pub correlation: bool,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_key: Option<String>,
}

/// GET|POST /log - Emit one entry now, or start a repeating log job.
///
/// `message` in the response is the caller's message, or a sample of what
/// will be generated.
pub async fn generate_logs(
    State(state): State<Arc<AppState>>,
    correlation_id: CorrelationId,
    Command { input, .. }: Command<LogInput>,
) -> Json<LogResponse> {
    let params = input.validate();
    let job_key = state.logs.start(&params, Some(correlation_id.as_str()));

    Json(LogResponse {
        level: params.level.to_string(),
        size: params.size.to_string(),
        message: resolve_message(params.message.as_deref(), params.size),
        interval: params.interval,
        duration: params.duration,
        correlation: params.include_correlation,
        status: "log generation started".to_string(),
        job_key,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/log", get(generate_logs).post(generate_logs))
}
