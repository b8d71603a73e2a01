// crates/server/src/routes/info.rs
//! Application, process, user and cluster placement details.
//!
//! Cluster placement is read from environment variables that are usually
//! injected by the orchestrator (downward API or image build args).

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use dummybox_core::workload::process_owner;
use serde::Serialize;

use super::health::BuildInfo;
use crate::state::AppState;

const NOT_AVAILABLE: &str = "not available";

#[derive(Debug, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub start_time: DateTime<Utc>,
    pub uptime: String,
    pub os: &'static str,
    pub arch: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub uid: String,
    pub gid: String,
}

#[derive(Debug, Serialize)]
pub struct ClusterPosition {
    pub container_id: String,
    pub image_name: String,
    pub image_tag: String,
    pub node_name: String,
    pub pod_name: String,
    pub namespace: String,
    pub resource_limits: String,
    pub resource_requests: String,
}

impl ClusterPosition {
    /// Read placement through `lookup`; missing or empty values read as
    /// "not available".
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        Self {
            container_id: get("HOSTNAME"),
            image_name: get("DUMMYBOX_IMAGE_NAME"),
            image_tag: get("DUMMYBOX_IMAGE_TAG"),
            node_name: get("NODE_NAME"),
            pod_name: get("POD_NAME"),
            namespace: get("NAMESPACE"),
            resource_limits: get("DUMMYBOX_RESOURCE_LIMITS"),
            resource_requests: get("DUMMYBOX_RESOURCE_REQUESTS"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub application: BuildInfo,
    pub process: ProcessInfo,
    pub user: UserInfo,
    pub cluster_position: ClusterPosition,
    pub active_jobs: usize,
}

/// `42s`, `3m 5s` or `2h 0m 7s`.
pub fn format_uptime(total_secs: u64) -> String {
    if total_secs < 60 {
        return format!("{total_secs}s");
    }
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// GET /info
pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let owner = tokio::task::spawn_blocking(process_owner)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "process owner lookup failed");
            Default::default()
        });

    Json(InfoResponse {
        application: BuildInfo::current(),
        process: ProcessInfo {
            pid: std::process::id(),
            start_time: state.started_at,
            uptime: format_uptime(state.uptime_secs()),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        },
        user: UserInfo {
            uid: owner.uid.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            gid: owner.gid.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
        cluster_position: ClusterPosition::from_lookup(|name| std::env::var(name).ok()),
        active_jobs: state.jobs.len(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/info", get(info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(185), "3m 5s");
        assert_eq!(format_uptime(7207), "2h 0m 7s");
    }

    #[test]
    fn test_cluster_position_defaults() {
        let env = HashMap::from([
            ("POD_NAME", "dummybox-7d9f"),
            ("NAMESPACE", ""),
        ]);
        let position = ClusterPosition::from_lookup(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(position.pod_name, "dummybox-7d9f");
        assert_eq!(position.namespace, "not available");
        assert_eq!(position.node_name, "not available");
    }
}
