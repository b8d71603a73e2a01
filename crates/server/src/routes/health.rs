// crates/server/src/routes/health.rs
//! Liveness, readiness and build information.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Build metadata, stamped at compile time when available.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct BuildInfo {
    pub version: String,
    pub build_date: String,
    pub rust_version: String,
    pub git_commit: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_date: option_env!("DUMMYBOX_BUILD_DATE").unwrap_or("unknown").to_string(),
            rust_version: option_env!("DUMMYBOX_RUST_VERSION").unwrap_or("unknown").to_string(),
            git_commit: option_env!("DUMMYBOX_GIT_COMMIT").unwrap_or("unknown").to_string(),
        }
    }
}

/// Response for the version endpoint.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct VersionResponse {
    #[serde(flatten)]
    pub build: BuildInfo,
    pub uptime_secs: u64,
}

/// GET /healthz and /readyz - Plain `OK` while the process is serving.
pub async fn ok() -> &'static str {
    "OK"
}

/// GET /version
pub async fn version(State(state): State<Arc<AppState>>) -> Json<VersionResponse> {
    Json(VersionResponse {
        build: BuildInfo::current(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(ok))
        .route("/readyz", get(ok))
        .route("/version", get(version))
}
