//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Submission request:
//!     → rate_limit.rs (per-client sliding window)
//!     → handler validation
//!
//! Project query:
//!     → sanitize.rs (strip markup from query parameters)
//!     → record store
//! ```
//!
//! # Design Decisions
//! - Rate limiting happens before the body is parsed
//! - Sanitization is tag stripping only; output escaping happens where HTML is built

pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::{Admission, Clock, InMemoryWindowStore, ManualClock, SlidingWindowLimiter, SystemClock, WindowStore};
pub use sanitize::{sanitize, sanitize_param, sanitize_value};
