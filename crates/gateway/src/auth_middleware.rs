use axum::{
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use {secrecy::ExposeSecret, tracing::debug};

use crate::{error::ApiError, state::AppState};

/// Middleware that protects admin routes behind a static bearer token.
///
/// When no admin token is configured all requests pass through.
pub async fn require_admin(
    State(state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_ref() else {
        return next.run(request).await;
    };

    if let Some(token) = bearer_token(request.headers())
        && constant_time_eq(token.as_bytes(), expected.expose_secret().as_bytes())
    {
        return next.run(request).await;
    }

    debug!(path = %request.uri().path(), "admin request rejected");
    ApiError::Unauthorized.into_response()
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
