//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay environment)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via ArcSwap in the HTTP state
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<ServiceConfig>
//!     → rate limiter picks up new window settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Collaborator clients (regions, backend kind) are fixed at startup;
//!   reloads only affect per-request settings

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, AwsConfig, BackendKind, EmailConfig, EmailFailurePolicy, IdempotencyConfig,
    ListenerConfig, ObservabilityConfig, RateLimitConfig, SecurityConfig, ServiceConfig,
    StorageConfig, TimeoutConfig,
};
