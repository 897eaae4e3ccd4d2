//! Retry engine.
//!
//! Runs a caller-supplied async operation until it succeeds, fails with a
//! terminal error, or exhausts the policy. Every failure is normalized into a
//! [`NotificationError`] before the retry decision; only the last error is
//! returned. The engine never propagates or panics: outcomes are values.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::notifications::NotificationError;
use crate::resilience::backoff::RetryPolicy;

/// Result of one [`with_retry`] run.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// The operation's value, or the last error seen.
    pub result: Result<T, NotificationError>,
    /// Invocations of the operation, including the first.
    pub attempts: u32,
    /// Wall-clock time from the first attempt to the final outcome.
    pub total_duration: Duration,
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&NotificationError> {
        self.result.as_ref().err()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RetryOutcome<U> {
        RetryOutcome {
            result: self.result.map(f),
            attempts: self.attempts,
            total_duration: self.total_duration,
        }
    }
}

/// Execute `operation` with exponential backoff between failed attempts.
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    operation_name: &str,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<NotificationError>,
{
    let start = Instant::now();
    let total = policy.total_attempts();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        tracing::debug!(operation = operation_name, attempt, total, "Attempting");

        let error = match operation().await {
            Ok(value) => {
                let elapsed = start.elapsed();
                tracing::info!(
                    operation = operation_name,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Succeeded"
                );
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                    total_duration: elapsed,
                };
            }
            Err(e) => e.into(),
        };

        tracing::warn!(
            operation = operation_name,
            attempt,
            error = %error,
            code = %error.code,
            retryable = error.retryable,
            "Attempt failed"
        );

        if !error.retryable {
            tracing::error!(operation = operation_name, code = %error.code, "Non-retryable error, aborting");
            return finish(error, attempt, start);
        }
        if attempt >= total {
            tracing::error!(operation = operation_name, attempts = attempt, "Retries exhausted");
            return finish(error, attempt, start);
        }

        let delay = policy.delay_for(attempt - 1);
        tracing::info!(
            operation = operation_name,
            delay_ms = delay.as_millis() as u64,
            "Retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

fn finish<T>(error: NotificationError, attempts: u32, start: Instant) -> RetryOutcome<T> {
    RetryOutcome {
        result: Err(error),
        attempts,
        total_duration: start.elapsed(),
    }
}
