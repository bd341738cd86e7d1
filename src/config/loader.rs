//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{BackendKind, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ServiceConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build configuration from defaults plus environment, for deployments that
/// ship no config file.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    let mut config = ServiceConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay deployment values from the environment. Unset or empty variables
/// leave the file value untouched.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = get("AWS_REGION") {
        config.aws.region = v;
    }
    if let Some(v) = get("S3_REGION") {
        config.aws.s3_region = Some(v);
    }
    if let Some(v) = get("DYNAMODB_REGION") {
        config.aws.dynamodb_region = Some(v);
    }
    if let Some(v) = get("SES_REGION") {
        config.aws.ses_region = Some(v);
    }
    if let Some(v) = get("SUBMISSIONS_TABLE") {
        config.storage.submissions_table = v;
    }
    if let Some(v) = get("PROJECTS_TABLE") {
        config.storage.projects_table = v;
    }
    if let Some(v) = get("PROJECTS_CATEGORY_INDEX") {
        config.storage.category_index = v;
    }
    if let Some(v) = get("RESUME_BUCKET") {
        config.storage.resume_bucket = v;
    }
    if let Some(v) = get("FROM_EMAIL") {
        config.email.from = v;
    }
    if let Some(v) = get("NOTIFY_EMAIL") {
        config.email.operator = v;
    }
    if let Some(v) = get("ADMIN_SECRET_KEY") {
        config.admin.api_key = v;
    }
    if let Some(v) = get("DEV_MODE") {
        config.security.dev_mode = matches!(v.trim(), "1" | "true" | "yes");
    }
    if let Some(v) = get("TRUSTED_PROXIES") {
        config.security.trusted_proxies = v
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter_map(|p| match p.parse() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(value = %p, "Ignoring unparseable TRUSTED_PROXIES entry");
                    None
                }
            })
            .collect();
    }
    if let Some(v) = get("STORAGE_BACKEND") {
        match v.trim() {
            "memory" => config.storage.backend = BackendKind::Memory,
            "aws" => config.storage.backend = BackendKind::Aws,
            other => tracing::warn!(value = %other, "Ignoring unknown STORAGE_BACKEND"),
        }
    }
}
