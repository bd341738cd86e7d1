//! Contact form and portfolio handlers.
//!
//! A small HTTP service behind a static site: it accepts contact submissions
//! (with an optional inline resume), serves the public project portfolio and
//! lets an admin curate it. Storage, object upload and email are reached
//! through collaborator traits with AWS and in-memory implementations.

pub mod admin;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod projects;
pub mod security;
pub mod services;
pub mod submissions;
pub mod validation;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use services::Collaborators;
