//! Response headers shared by every endpoint.
//!
//! # Design Decisions
//! - CORS is static: any origin, fixed method and header lists
//! - Headers are only set when a handler didn't set them itself
//! - Credentials are allowed on the submissions listing only

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Admin-Key, Idempotency-Key";

/// Short public caching for project listings.
pub const PROJECTS_CACHE_CONTROL: &str = "public, max-age=300";

fn if_not_present(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
}

pub fn allow_origin() -> SetResponseHeaderLayer<HeaderValue> {
    if_not_present(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN)
}

pub fn allow_methods() -> SetResponseHeaderLayer<HeaderValue> {
    if_not_present(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
}

pub fn allow_headers() -> SetResponseHeaderLayer<HeaderValue> {
    if_not_present(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
}

pub fn allow_credentials() -> SetResponseHeaderLayer<HeaderValue> {
    if_not_present(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")
}

/// CORS preflight. The headers come from the layers above.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
