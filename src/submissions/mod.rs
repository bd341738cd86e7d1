//! Contact form submissions.
//!
//! # Data Flow
//! ```text
//! POST /api/submit
//!     → idempotency.rs (replay of a recent accepted key)
//!     → rate limiter
//!     → parse + validate
//!     → resume upload (best effort)
//!     → record write
//!     → notifications.rs (operator, then submitter)
//! ```

pub mod handlers;
pub mod idempotency;
pub mod notifications;

pub use handlers::{decode_inline_file, list_submissions, submit};
pub use idempotency::IdempotencyCache;
