// crates/observability/src/correlation.rs
//! Correlation IDs.
//!
//! Every request carries an `X-Correlation-ID`: the caller's when present,
//! otherwise a fresh UUID v4. The ID is recorded on the request span, echoed
//! on the response, and available to handlers through [`CorrelationId`].

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName, Request},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

fn header_name() -> HeaderName {
    HeaderName::from_static(CORRELATION_HEADER)
}

/// Wrap a router with the correlation layer stack: assign the ID, open the
/// request span with it, and copy it to the response.
pub fn with_correlation<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let correlation_id = request
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            correlation_id,
        )
    });

    // Outermost layer is added last.
    router
        .layer(PropagateRequestIdLayer::new(header_name()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(header_name(), MakeRequestUuid))
}

/// The request's correlation ID.
///
/// Falls back to a new UUID when the layer stack is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(CorrelationId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tower::ServiceExt;

    fn app() -> Router {
        with_correlation(Router::new().route("/", get(|id: CorrelationId| async move { id.0 })))
    }

    async fn call(request: Request<Body>) -> (Option<String>, String) {
        let response = app().oneshot(request).await.unwrap();
        let header = response
            .headers()
            .get(CORRELATION_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_incoming_id_is_reused() {
        let request = Request::builder()
            .uri("/")
            .header("X-Correlation-ID", "abc-123")
            .body(Body::empty())
            .unwrap();
        let (header, body) = call(request).await;
        assert_eq!(header.as_deref(), Some("abc-123"));
        assert_eq!(body, "abc-123");
    }

    #[tokio::test]
    async fn test_missing_id_is_generated() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (header, body) = call(request).await;
        let header = header.expect("correlation header on response");
        assert!(uuid::Uuid::parse_str(&header).is_ok(), "{header}");
        assert_eq!(body, header);
    }

    #[tokio::test]
    async fn test_extractor_without_layers() {
        let app = Router::new().route("/", get(|id: CorrelationId| async move { id.0 }));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(uuid::Uuid::parse_str(std::str::from_utf8(&body).unwrap()).is_ok());
    }
}
