//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Root configuration for the contact service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// AWS regions for each collaborator.
    pub aws: AwsConfig,

    /// Table, index and bucket names.
    pub storage: StorageConfig,

    /// Sender/recipient addresses and failure policy.
    pub email: EmailConfig,

    /// Submission rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Caller supplied idempotency keys.
    pub idempotency: IdempotencyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Regions for the managed services. Service specific regions fall back to
/// `region` when unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
    pub s3_region: Option<String>,
    pub dynamodb_region: Option<String>,
    pub ses_region: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            s3_region: None,
            dynamodb_region: None,
            ses_region: None,
        }
    }
}

impl AwsConfig {
    pub fn s3_region(&self) -> &str {
        self.s3_region.as_deref().unwrap_or(&self.region)
    }

    pub fn dynamodb_region(&self) -> &str {
        self.dynamodb_region.as_deref().unwrap_or(&self.region)
    }

    pub fn ses_region(&self) -> &str {
        self.ses_region.as_deref().unwrap_or(&self.region)
    }
}

/// Which collaborator implementations to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// S3 + DynamoDB + SES.
    Aws,
    /// In-process stores, emails are only logged. For local development.
    Memory,
}

/// Storage names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,

    /// Table holding contact submissions.
    pub submissions_table: String,

    /// Table holding portfolio projects.
    pub projects_table: String,

    /// Secondary index on `category` of the projects table.
    pub category_index: String,

    /// Bucket receiving resume uploads.
    pub resume_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Aws,
            submissions_table: "contact-submissions".to_string(),
            projects_table: "portfolio-projects".to_string(),
            category_index: "category-index".to_string(),
            resume_bucket: "contact-resumes".to_string(),
        }
    }
}

/// What happens when a notification email cannot be sent after the
/// submission record has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailFailurePolicy {
    /// Fail the request with a 500 even though the record exists.
    Abort,
    /// Log the failure and still answer 200.
    Log,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Verified sender address.
    pub from: String,

    /// Operator address receiving new submission notifications.
    pub operator: String,

    pub failure_policy: EmailFailurePolicy,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: "noreply@example.com".to_string(),
            operator: "owner@example.com".to_string(),
            failure_policy: EmailFailurePolicy::Abort,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Trailing window length in milliseconds.
    pub window_ms: u64,

    /// Accepted submissions per client inside one window.
    pub max_per_window: u32,

    /// Upper bound on tracked client identifiers.
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_per_window: 3,
            max_tracked_clients: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    pub enabled: bool,

    /// How long an accepted key is remembered.
    pub ttl_secs: u64,

    /// Upper bound on remembered keys.
    pub max_entries: usize,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 600,
            max_entries: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared secret expected in `X-Admin-Key` (or as a Bearer token).
    /// Empty rejects every admin request.
    pub api_key: String,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Required prefix of project image URLs.
    pub trusted_image_prefix: String,

    /// Expose upstream error details in error bodies.
    pub dev_mode: bool,

    /// Peers whose `X-Forwarded-For`, `X-Real-IP` and `Client-IP` headers
    /// are believed. Requests from any other peer are identified by their
    /// socket address.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 8 * 1024 * 1024, // 8MB, resumes arrive base64 encoded
            trusted_image_prefix: crate::validation::DEFAULT_TRUSTED_IMAGE_PREFIX.to_string(),
            dev_mode: false,
            trusted_proxies: Vec::new(),
        }
    }
}
