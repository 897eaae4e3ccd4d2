//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Retry limits and backoff shape for one guarded operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total invocations are `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Ceiling applied to the exponential term (before jitter).
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Total number of invocations this policy allows.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Jitter-free delay before attempt `attempt_index + 2`.
    ///
    /// `min(base * multiplier^attempt_index, max_delay)`.
    pub fn base_delay_for(&self, attempt_index: u32) -> Duration {
        let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let exponential = self.base_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = exponential.min(self.max_delay.as_nanos() as f64).max(0.0);
        Duration::from_nanos(capped as u64)
    }

    /// Delay with up to 10% additive jitter.
    ///
    /// Jitter is applied after the cap, so the result may exceed `max_delay`
    /// by up to 10%.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let capped = self.base_delay_for(attempt_index);
        let jitter = rand::thread_rng().gen_range(0.0..0.1);
        capped.mul_f64(1.0 + jitter)
    }
}
