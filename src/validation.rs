//! Input validation for submissions and projects.
//!
//! Checks are shallow on purpose: the email pattern only rejects obviously
//! malformed addresses, and project checks collect every violation instead of
//! stopping at the first one.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::{ProjectStatus, SubmitRequest};

/// Image URLs must come from the media host the site is served from.
pub const DEFAULT_TRUSTED_IMAGE_PREFIX: &str = "https://res.cloudinary.com/";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// `local@domain.rest` with no whitespace or extra `@` in any part.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Names of required submission fields that are absent or empty.
pub fn missing_required_fields(request: &SubmitRequest) -> Vec<&'static str> {
    let fields = [
        ("name", &request.name),
        ("email", &request.email),
        ("message", &request.message),
    ];

    fields
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name)
        .collect()
}

/// Validate an untyped project document. An empty result means valid.
pub fn validate_project(project: &Value, trusted_prefix: &str) -> Vec<String> {
    let mut errors = Vec::new();

    // Empty strings count as absent.
    let string_field = |name: &str| {
        project
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    if string_field("category").is_none() {
        errors.push("Category is required and must be a string".to_string());
    }

    match string_field("title") {
        None => errors.push("Title is required and must be a string".to_string()),
        Some(title) if title.chars().count() < 3 => {
            errors.push("Title must be at least 3 characters long".to_string())
        }
        Some(_) => {}
    }

    if string_field("description").is_none() {
        errors.push("Description is required and must be a string".to_string());
    }

    match string_field("imageUrl") {
        None => errors.push("Image URL is required and must be a string".to_string()),
        Some(url) if !url.starts_with(trusted_prefix) => {
            errors.push(format!("Image URL must be from Cloudinary ({trusted_prefix})"))
        }
        Some(_) => {}
    }

    match project.get("tags") {
        None | Some(Value::Null) => {}
        Some(Value::Array(tags)) => {
            if tags.iter().any(|t| !t.is_string()) {
                errors.push("Tags must contain only strings".to_string());
            }
        }
        Some(_) => errors.push("Tags must be an array".to_string()),
    }

    match project.get("order") {
        None | Some(Value::Null) | Some(Value::Number(_)) => {}
        Some(_) => errors.push("Order must be a number".to_string()),
    }

    match project.get("status") {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) if s.parse::<ProjectStatus>().is_ok() => {}
        Some(_) => errors.push("Status must be one of: published, draft, archived".to_string()),
    }

    errors
}
