// crates/server/src/routes/memory.rs
//! Memory pressure endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dummybox_core::{JobError, MemoryBlock, MemoryInput};
use serde::Serialize;

use super::input::{Command, Format};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct MemoryResponse {
    pub size_mb: u64,
    pub duration: u64,
    pub allocation_key: String,
    pub current_heap_mb: f64,
    pub message: String,
}

/// GET|POST /memory - Allocate and hold memory, then return immediately.
///
/// The fill runs on the blocking pool so large requests do not stall the
/// runtime.
pub async fn allocate_memory(
    State(state): State<Arc<AppState>>,
    Command { input, format }: Command<MemoryInput>,
) -> ApiResult<Response> {
    let params = input.validate();
    let size_mb = params.size_mb;
    let block = tokio::task::spawn_blocking(move || MemoryBlock::allocate(size_mb))
        .await
        .map_err(|e| ApiError::Internal(format!("allocation task failed: {e}")))?
        .map_err(|e| JobError::allocation(size_mb, e))?;
    let hold = state.memory.hold(block, params.duration);

    let message = format!(
        "Allocated {}MB of memory for {} seconds",
        hold.size_mb, hold.duration
    );
    Ok(match format {
        Format::Text => format!(
            "{message}\nCurrent heap size: {:.2}MB\nAllocation key: {}\n",
            hold.current_heap_mb, hold.allocation_key
        )
        .into_response(),
        Format::Json => Json(MemoryResponse {
            size_mb: hold.size_mb,
            duration: hold.duration,
            allocation_key: hold.allocation_key,
            current_heap_mb: hold.current_heap_mb,
            message,
        })
        .into_response(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/memory", get(allocate_memory).post(allocate_memory))
}
