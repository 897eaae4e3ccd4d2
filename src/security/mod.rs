//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Admin login request:
//!     → client_id.rs (resolve client from proxy headers)
//!     → rate_limit.rs (check, record failure, clear on success)
//!     → admin::handlers (translate denial into 429)
//! ```
//!
//! Decisions are advisory; the limiter never fails a request by itself.

pub mod client_id;
pub mod rate_limit;

pub use client_id::{client_id, UNKNOWN_CLIENT};
pub use rate_limit::{
    LoginAttemptRecord, LoginRateLimiter, RateLimitDecision, ATTEMPT_WINDOW, CLEANUP_INTERVAL,
    LOCKOUT_DURATION, MAX_ATTEMPTS,
};
