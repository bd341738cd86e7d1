//! Admin key check for project writes.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ProjectError};
use crate::http::server::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Key from `X-Admin-Key`, falling back to `Authorization: Bearer <key>`.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(ADMIN_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(key.trim()).filter(|k| !k.is_empty());
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// An empty configured secret never matches.
pub fn is_authorized(presented: Option<&str>, secret: &str) -> bool {
    match presented {
        Some(key) if !secret.is_empty() => constant_time_compare(key, secret),
        _ => false,
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = state.config();

    if is_authorized(presented_key(request.headers()), &config.admin.api_key) {
        return next.run(request).await;
    }

    tracing::warn!(
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected admin request"
    );
    ProjectError::new(ApiError::Unauthorized, "Unauthorized", config.security.dev_mode).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_either_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_key(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(presented_key(&headers), Some("abc"));

        headers.insert(ADMIN_KEY_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(presented_key(&headers), Some("xyz"));
    }

    #[test]
    fn empty_secret_rejects_everything() {
        assert!(!is_authorized(Some(""), ""));
        assert!(!is_authorized(Some("anything"), ""));
        assert!(!is_authorized(None, "secret"));
        assert!(!is_authorized(Some("secreT"), "secret"));
        assert!(!is_authorized(Some("secret!"), "secret"));
        assert!(is_authorized(Some("secret"), "secret"));
    }
}
