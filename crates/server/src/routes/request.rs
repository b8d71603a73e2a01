// crates/server/src/routes/request.rs
//! Echo of the incoming request.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    routing::any,
    Json, Router,
};
use serde::Serialize;

use super::input::QueryPairs;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RequestEcho {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub query_parameters: BTreeMap<String, Vec<String>>,
    pub body: String,
}

/// Header values grouped by lowercase name, in arrival order.
fn group_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        grouped
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    grouped
}

/// Any method on /request - Reflect method, URL, headers, query and body.
pub async fn echo_request(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<RequestEcho> {
    Json(RequestEcho {
        method: method.to_string(),
        url: uri.to_string(),
        headers: group_headers(&headers),
        query_parameters: QueryPairs::from_uri(&uri).grouped(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/request", any(echo_request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_repeated_headers_are_grouped() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers.insert("accept", HeaderValue::from_static("*/*"));

        let grouped = group_headers(&headers);
        assert_eq!(grouped["x-tag"], vec!["a", "b"]);
        assert_eq!(grouped["accept"], vec!["*/*"]);
    }
}
