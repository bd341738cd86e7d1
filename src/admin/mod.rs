//! Admin-only project management.
//!
//! The routes themselves are registered in [`crate::http::server`]; this module
//! holds the key check and the write handlers it guards.

pub mod auth;
pub mod handlers;

pub use auth::{admin_auth_middleware, is_authorized, presented_key, ADMIN_KEY_HEADER};
pub use handlers::{create_project, delete_project, update_project};
