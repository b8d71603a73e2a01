// crates/server/src/routes/delay.rs
//! Delayed responses with a chosen status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dummybox_core::{DelayInput, DelayParams};
use serde::Serialize;
use std::sync::Arc;

use super::input::{Command, Format};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct DelayResponse {
    pub duration: u64,
    pub code: u16,
    pub message: String,
}

/// Status to answer with. Validation already bounds the code to 100..=599.
pub(crate) fn status_for(params: &DelayParams) -> StatusCode {
    StatusCode::from_u16(params.code).unwrap_or(StatusCode::OK)
}

/// GET|POST /delay - Sleep, then answer with the requested status code.
pub async fn delay(Command { input, format }: Command<DelayInput>) -> Response {
    let params = input.validate();
    tracing::info!(duration = params.duration, code = params.code, "delaying response");
    tokio::time::sleep(params.sleep()).await;

    let message = format!(
        "Delayed for {} seconds with status code {}",
        params.duration, params.code
    );
    let status = status_for(&params);
    match format {
        Format::Text => (status, format!("{message}\n")).into_response(),
        Format::Json => (
            status,
            Json(DelayResponse {
                duration: params.duration,
                code: params.code,
                message,
            }),
        )
            .into_response(),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/delay", get(delay).post(delay))
}
