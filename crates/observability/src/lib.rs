// crates/observability/src/lib.rs
//! Process-wide logging setup and request correlation.

pub mod correlation;
pub mod logging;

pub use correlation::{with_correlation, CorrelationId, CORRELATION_HEADER};
pub use logging::{env_filter, init_tracing, severity_split};
