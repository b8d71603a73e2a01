// crates/server/src/routes/env.rs
//! Process environment dump.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::input::{Command, Format, FromQuery, QueryPairs};
use crate::state::AppState;

/// Raw input for `/env`; only the format can be chosen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvInput {
    pub format: Option<String>,
}

impl FromQuery for EnvInput {
    fn from_query(query: &QueryPairs) -> Self {
        Self {
            format: query.get("format").map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnvResponse {
    pub format: &'static str,
    pub count: usize,
    pub environment_variables: BTreeMap<String, String>,
}

/// Every environment variable, sorted by name. Non-UTF-8 names and values
/// are converted lossily.
pub fn environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(name, value)| {
            (
                name.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

/// Plain-text rendering, one `NAME=value` line per variable.
pub fn render_text(vars: &BTreeMap<String, String>) -> String {
    let mut text = format!("Environment Variables ({} total):\n\n", vars.len());
    for (name, value) in vars {
        text.push_str(&format!("{name}={value}\n"));
    }
    text
}

/// GET|POST /env - Dump the process environment as JSON or text.
///
/// The format comes from the `format` query parameter or, on POST, the body.
/// Anything other than `text` selects JSON.
pub async fn dump_env(Command { input, format }: Command<EnvInput>) -> Response {
    let wants_text = format == Format::Text
        || matches!(input.format.as_deref(), Some(f) if f.eq_ignore_ascii_case("text"));
    let vars = environment();
    tracing::info!(count = vars.len(), text = wants_text, "environment dumped");

    if wants_text {
        render_text(&vars).into_response()
    } else {
        Json(EnvResponse {
            format: "json",
            count: vars.len(),
            environment_variables: vars,
        })
        .into_response()
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/env", get(dump_env).post(dump_env))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_is_sorted_with_count() {
        let vars = BTreeMap::from([
            ("ZETA".to_string(), "last".to_string()),
            ("ALPHA".to_string(), "a=b".to_string()),
        ]);
        assert_eq!(
            render_text(&vars),
            "Environment Variables (2 total):\n\nALPHA=a=b\nZETA=last\n"
        );
    }

    #[test]
    fn test_environment_matches_process() {
        let vars = environment();
        assert_eq!(vars.len(), std::env::vars_os().count());
    }
}
