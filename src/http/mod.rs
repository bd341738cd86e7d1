//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, middleware, admin gate)
//!     → request.rs (client id, idempotency key)
//!     → submissions / projects / admin handlers
//!     → response.rs (CORS and caching headers)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{client_id, idempotency_key, IDEMPOTENCY_KEY_HEADER, UNKNOWN_CLIENT};
pub use server::{build_router, AppState, HttpServer};
