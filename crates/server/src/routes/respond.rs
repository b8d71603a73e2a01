// crates/server/src/routes/respond.rs
//! Delayed responses with caller-chosen headers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dummybox_core::RespondInput;
use serde::Serialize;

use super::delay::status_for;
use super::input::{Command, Format};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct RespondResponse {
    pub duration: u64,
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// GET|POST /respond - Like /delay, plus custom response headers.
pub async fn respond(Command { input, format }: Command<RespondInput>) -> Response {
    let params = input.validate();
    tracing::info!(
        duration = params.delay.duration,
        code = params.delay.code,
        headers_count = params.headers.len(),
        "responding with custom parameters"
    );
    tokio::time::sleep(params.delay.sleep()).await;

    let message = format!(
        "Responded after {} seconds with status code {}",
        params.delay.duration, params.delay.code
    );
    let status = status_for(&params.delay);

    let mut response = match format {
        Format::Text => {
            let mut text = format!("{message}\n");
            if !params.headers.is_empty() {
                text.push_str("Custom Headers:\n");
                for (name, value) in &params.headers {
                    text.push_str(&format!("  {name}: {value}\n"));
                }
            }
            (status, text).into_response()
        }
        Format::Json => (
            status,
            Json(RespondResponse {
                duration: params.delay.duration,
                code: params.delay.code,
                message,
                headers: (!params.headers.is_empty()).then(|| params.headers.clone()),
            }),
        )
            .into_response(),
    };

    apply_headers(&mut response, &params.headers);
    response
}

/// Copy caller headers onto the response. Pairs that are not valid HTTP are
/// skipped. The body's own content type is kept.
fn apply_headers(response: &mut Response, headers: &BTreeMap<String, String>) {
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    for (name, value) in headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "skipping invalid custom header"),
        }
    }
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/respond", get(respond).post(respond))
}
