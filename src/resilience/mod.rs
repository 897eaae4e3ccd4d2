//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound delivery call:
//!     → retries.rs (run, normalize error, decide)
//!     → backoff.rs (exponential delay + jitter before next attempt)
//!     → RetryOutcome { result, attempts, total_duration }
//! ```
//!
//! No cancellation and no per-attempt timeout: a run ends on success, a
//! terminal error, or exhausted retries. Callers bound individual calls
//! themselves (the HTTP client timeout).

pub mod backoff;
pub mod retries;

pub use backoff::RetryPolicy;
pub use retries::{with_retry, RetryOutcome};
