// crates/observability/src/logging.rs
//! Tracing subscriber setup.
//!
//! Output is JSON, one object per line. WARN and ERROR events go to stderr,
//! everything else to stdout, so log shippers can split severities by stream.

use tracing::Level;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt, OrElse, WithMaxLevel};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` when set, otherwise `level` for everything.
pub fn env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}

/// Route WARN and ERROR events to `errors`, everything else to `rest`.
pub fn severity_split<E, O>(errors: E, rest: O) -> OrElse<WithMaxLevel<E>, O>
where
    E: for<'a> MakeWriter<'a>,
    O: for<'a> MakeWriter<'a>,
{
    errors.with_max_level(Level::WARN).or_else(rest)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(level: &str) -> anyhow::Result<()> {
    let writer = severity_split(std::io::stderr, std::io::stdout);

    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_env_filter(env_filter(level)?)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
