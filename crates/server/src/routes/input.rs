// crates/server/src/routes/input.rs
//! Request input for the command endpoints: query string on GET, JSON body
//! on POST. The response format is always taken from the query string.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::{Method, Uri},
};
use dummybox_core::params::FlagInput;
use dummybox_core::{CpuInput, DelayInput, KillInput, LogInput, MemoryInput, RespondInput};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Ordered query parameters; repeated names are kept.
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    pub fn from_uri(uri: &Uri) -> Self {
        match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => Self(pairs),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable query string ignored");
                Self::default()
            }
        }
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `name` as an integer. Unparseable values count as absent.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Values grouped by name, each group in arrival order.
    pub fn grouped(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &self.0 {
            grouped.entry(name.clone()).or_default().push(value.clone());
        }
        grouped
    }

    /// Every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Body format selected with `format=text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

/// Build a command input from query parameters.
pub trait FromQuery {
    fn from_query(query: &QueryPairs) -> Self;
}

impl FromQuery for DelayInput {
    fn from_query(query: &QueryPairs) -> Self {
        Self {
            duration: query.get_i64("duration"),
            code: query.get_i64("code"),
        }
    }
}

impl FromQuery for RespondInput {
    /// Headers come as repeated `header_name` / `header_value` pairs; an
    /// unpaired name is dropped.
    fn from_query(query: &QueryPairs) -> Self {
        let headers = query
            .get_all("header_name")
            .zip(query.get_all("header_value"))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self {
            duration: query.get_i64("duration"),
            code: query.get_i64("code"),
            headers: Some(headers),
        }
    }
}

impl FromQuery for LogInput {
    fn from_query(query: &QueryPairs) -> Self {
        Self {
            level: query.get("level").map(str::to_string),
            size: query.get("size").map(str::to_string),
            message: query.get("message").map(str::to_string),
            interval: query.get_i64("interval"),
            duration: query.get_i64("duration"),
            correlation: query.get("correlation").map(|v| FlagInput::Text(v.to_string())),
        }
    }
}

impl FromQuery for CpuInput {
    fn from_query(query: &QueryPairs) -> Self {
        Self {
            intensity: query.get("intensity").map(str::to_string),
            duration: query.get_i64("duration"),
        }
    }
}

impl FromQuery for MemoryInput {
    fn from_query(query: &QueryPairs) -> Self {
        Self {
            size: query.get_i64("size"),
            duration: query.get_i64("duration"),
        }
    }
}

impl FromQuery for KillInput {
    fn from_query(query: &QueryPairs) -> Self {
        Self {
            delay: query.get_i64("delay"),
            code: query.get_i64("code"),
        }
    }
}

/// Raw command input plus the requested response format.
#[derive(Debug)]
pub struct Command<T> {
    pub input: T,
    pub format: Format,
}

impl<S, T> FromRequest<S> for Command<T>
where
    S: Send + Sync,
    T: DeserializeOwned + FromQuery + Send,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = QueryPairs::from_uri(request.uri());
        let format = match query.get("format") {
            Some("text") => Format::Text,
            _ => Format::Json,
        };

        let input = if request.method() == Method::POST {
            let body = Bytes::from_request(request, state)
                .await
                .map_err(|e| ApiError::Internal(format!("failed to read request body: {e}")))?;
            serde_json::from_slice(&body).map_err(ApiError::InvalidBody)?
        } else {
            T::from_query(&query)
        };

        Ok(Self { input, format })
    }
}
