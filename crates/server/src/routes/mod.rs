// crates/server/src/routes/mod.rs
//! Route handlers for the dummybox server.

pub mod cpu;
pub mod delay;
pub mod env;
pub mod health;
pub mod info;
pub mod input;
pub mod jobs;
pub mod kill;
pub mod log;
pub mod memory;
pub mod metrics;
pub mod request;
pub mod respond;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Routes behind the token gate.
///
/// Routes (each accepts GET with query parameters or POST with a JSON body,
/// except /jobs which is GET only):
/// - /delay   - Sleep, then answer with a status code
/// - /respond - Like /delay, plus custom response headers
/// - /log     - Emit log entries, once or on an interval
/// - /cpu     - Start a CPU load job
/// - /memory  - Allocate and hold memory
/// - /kill    - Schedule process termination
/// - /jobs    - Live background jobs
/// - /env     - Process environment (JSON or text)
pub fn command_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(delay::router())
        .merge(respond::router())
        .merge(log::router())
        .merge(cpu::router())
        .merge(memory::router())
        .merge(kill::router())
        .merge(jobs::router())
        .merge(env::router())
}

/// Open routes: /healthz, /readyz, /version, /info, /request and the
/// metrics path.
pub fn open_routes(metrics_path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(info::router())
        .merge(request::router())
        .merge(metrics::router(metrics_path))
}
