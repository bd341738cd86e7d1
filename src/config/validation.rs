//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, limits > 0, addresses parse)
//! - Check that required names and addresses are present
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BackendKind, ServiceConfig};
use crate::validation::validate_email;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if config.rate_limit.max_per_window == 0 {
        errors.push(ValidationError::new("rate_limit.max_per_window", "must be greater than 0"));
    }
    if config.rate_limit.max_tracked_clients == 0 {
        errors.push(ValidationError::new("rate_limit.max_tracked_clients", "must be greater than 0"));
    }

    if config.idempotency.enabled && config.idempotency.ttl_secs == 0 {
        errors.push(ValidationError::new("idempotency.ttl_secs", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    if !config.security.trusted_image_prefix.starts_with("https://") {
        errors.push(ValidationError::new(
            "security.trusted_image_prefix",
            "must be an https:// prefix",
        ));
    }

    if !validate_email(&config.email.from) {
        errors.push(ValidationError::new("email.from", "not an email address"));
    }
    if !validate_email(&config.email.operator) {
        errors.push(ValidationError::new("email.operator", "not an email address"));
    }

    if config.storage.backend == BackendKind::Aws {
        let names = [
            ("storage.submissions_table", &config.storage.submissions_table),
            ("storage.projects_table", &config.storage.projects_table),
            ("storage.category_index", &config.storage.category_index),
            ("storage.resume_bucket", &config.storage.resume_bucket),
            ("aws.region", &config.aws.region),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(field, "must not be empty"));
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
