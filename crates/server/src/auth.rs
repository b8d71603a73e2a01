// crates/server/src/auth.rs
//! Token gate for the command endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, AuthFailure};
use crate::state::AppState;

pub const TOKEN_HEADER: &str = "x-auth-token";
pub const TOKEN_PARAM: &str = "token";

/// Compare the request token with the configured one.
///
/// The `token` query parameter wins over the `X-Auth-Token` header. With no
/// configured token every request passes.
pub fn check_token(expected: Option<&str>, request: &Request) -> Result<(), AuthFailure> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let from_query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(TOKEN_PARAM))
        .filter(|t| !t.is_empty());
    let provided = from_query.or_else(|| {
        request
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    });

    match provided {
        None => Err(AuthFailure::Missing),
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(AuthFailure::Invalid),
    }
}

/// Middleware rejecting requests without the configured token.
pub async fn require_token(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    match check_token(state.config.auth_token.as_deref(), &request) {
        Ok(()) => next.run(request).await,
        Err(reason) => ApiError::Unauthorized(reason).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = header {
            builder = builder.header("X-Auth-Token", token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_disabled_without_configured_token() {
        assert_eq!(check_token(None, &request("/cpu", None)), Ok(()));
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(check_token(Some("s3cret"), &request("/cpu", None)), Err(AuthFailure::Missing));
        assert_eq!(
            check_token(Some("s3cret"), &request("/cpu?token=", None)),
            Err(AuthFailure::Missing)
        );
    }

    #[test]
    fn test_query_token() {
        assert_eq!(check_token(Some("s3cret"), &request("/cpu?token=s3cret", None)), Ok(()));
        assert_eq!(
            check_token(Some("s3cret"), &request("/cpu?token=nope", None)),
            Err(AuthFailure::Invalid)
        );
    }

    #[test]
    fn test_header_token() {
        assert_eq!(check_token(Some("s3cret"), &request("/cpu", Some("s3cret"))), Ok(()));
        assert_eq!(
            check_token(Some("s3cret"), &request("/cpu", Some("wrong"))),
            Err(AuthFailure::Invalid)
        );
    }

    #[test]
    fn test_query_wins_over_header() {
        assert_eq!(
            check_token(Some("s3cret"), &request("/cpu?token=wrong", Some("s3cret"))),
            Err(AuthFailure::Invalid)
        );
    }
}
