// crates/server/src/lib.rs
//! dummybox server library.
//!
//! This crate provides the Axum-based HTTP server: command endpoints that
//! delay, respond, log, burn CPU, hold memory or terminate the process, plus
//! health, version and Prometheus endpoints.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::{Cli, Config, ConfigError};
pub use error::*;
pub use metrics::init_metrics;
pub use state::AppState;

use std::sync::Arc;

use axum::{middleware, Router};
use dummybox_observability::with_correlation;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Command routes behind the token gate
/// - Health, version and metrics routes
/// - Request metrics per matched route
/// - Correlation IDs and request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let commands = routes::command_routes().route_layer(middleware::from_fn_with_state(
        Arc::clone(&state),
        auth::require_token,
    ));

    let app = Router::new()
        .merge(commands)
        .merge(routes::open_routes(&state.config.metrics_path))
        .route_layer(middleware::from_fn(metrics::track_requests))
        .with_state(state);

    with_correlation(app)
}
