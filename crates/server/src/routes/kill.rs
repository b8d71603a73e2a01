// crates/server/src/routes/kill.rs
//! Delayed process termination endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use dummybox_core::KillInput;
use serde::Serialize;

use super::input::Command;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct KillResponse {
    pub delay: u64,
    pub code: i32,
    pub status: String,
}

/// GET|POST /kill - Schedule process exit and answer before it happens.
pub async fn kill(
    State(state): State<Arc<AppState>>,
    Command { input, .. }: Command<KillInput>,
) -> Json<KillResponse> {
    let params = input.validate();
    state.kill.schedule(params);
    Json(KillResponse {
        delay: params.delay,
        code: params.code,
        status: "termination scheduled".to_string(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/kill", get(kill).post(kill))
}
