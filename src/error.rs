//! Request-level error taxonomy and its HTTP mapping.
//!
//! Validation and rate-limit failures are detected before any collaborator is
//! called. Collaborator failures are not retried or told apart: they all end in
//! a generic 500 whose body never carries internal detail unless the caller
//! explicitly asks for it (dev mode on the listing endpoints).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::UpstreamError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Validation failed")]
    InvalidFields(Vec<String>),

    #[error("Too many submissions. Please try again later.")]
    RateLimited,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MalformedPayload(_) | ApiError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the caller. Server-side failures collapse to
    /// `fallback`.
    pub fn public_message(&self, fallback: &str) -> String {
        if self.status().is_server_error() {
            fallback.to_string()
        } else {
            self.to_string()
        }
    }

    /// Internal detail, only for server-side failures.
    pub fn detail(&self) -> Option<String> {
        self.status().is_server_error().then(|| self.to_string())
    }

    fn log(&self) {
        match self {
            ApiError::Upstream(e) => {
                crate::observability::metrics::record_upstream_error(e.collaborator());
                tracing::error!(error = %e, "Collaborator call failed");
            }
            ApiError::MalformedPayload(e) => tracing::warn!(error = %e, "Unreadable request body"),
            _ => {}
        }
    }
}

/// `{ "error": ... }` bodies used by the submission endpoint.
pub struct SubmissionError(pub ApiError);

impl From<ApiError> for SubmissionError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<UpstreamError> for SubmissionError {
    fn from(e: UpstreamError) -> Self {
        Self(ApiError::Upstream(e))
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();
        let body = json!({ "error": err.public_message("Failed to process submission") });
        (err.status(), Json(body)).into_response()
    }
}

/// `{ "success": false, "message": ..., "error"?: ... }` bodies used by the
/// project endpoints.
pub struct ProjectError {
    pub error: ApiError,
    pub fallback: &'static str,
    pub dev_mode: bool,
}

impl ProjectError {
    pub fn new(error: impl Into<ApiError>, fallback: &'static str, dev_mode: bool) -> Self {
        Self {
            error: error.into(),
            fallback,
            dev_mode,
        }
    }
}

impl IntoResponse for ProjectError {
    fn into_response(self) -> Response {
        let err = self.error;
        err.log();
        let mut body = json!({
            "success": false,
            "message": err.public_message(self.fallback),
        });
        if let ApiError::InvalidFields(errors) = &err {
            body["errors"] = json!(errors);
        }
        if self.dev_mode {
            if let Some(detail) = err.detail() {
                body["error"] = json!(detail);
            }
        }
        (err.status(), Json(body)).into_response()
    }
}

/// `{ "error": ..., "details"?: ... }` bodies used by the listing endpoint.
pub struct ListingError {
    pub error: ApiError,
    pub dev_mode: bool,
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let err = self.error;
        err.log();
        let mut body = json!({ "error": err.public_message("Failed to fetch submissions") });
        if self.dev_mode {
            if let Some(detail) = err.detail() {
                body["details"] = json!(detail);
            }
        }
        (err.status(), Json(body)).into_response()
    }
}
