//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, path, status
//! - `gateway_request_duration_seconds` (histogram): handler latency
//! - `gateway_login_attempts_total` (counter): admin logins by result
//! - `gateway_rate_limited_total` (counter): requests denied by a limiter
//! - `gateway_rate_limit_tracked_clients` (gauge): live attempt records
//! - `gateway_notifications_total` (counter): deliveries by channel, result
//! - `gateway_notification_attempts` (histogram): invocations per delivery
//! - `gateway_notification_duration_seconds` (histogram): delivery wall time
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::RetryOutcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_login(result: &'static str) {
    counter!("gateway_login_attempts_total", "result" => result).increment(1);
}

pub fn record_rate_limited(reason: &'static str) {
    counter!("gateway_rate_limited_total", "reason" => reason).increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("gateway_rate_limit_tracked_clients").set(count as f64);
}

/// Record one delivery outcome and emit it as a structured log line.
pub fn record_notification<T>(channel: &'static str, outcome: &RetryOutcome<T>) {
    let result = if outcome.is_success() { "success" } else { "failure" };

    counter!("gateway_notifications_total", "channel" => channel, "result" => result).increment(1);
    histogram!("gateway_notification_attempts", "channel" => channel).record(outcome.attempts as f64);
    histogram!("gateway_notification_duration_seconds", "channel" => channel)
        .record(outcome.total_duration.as_secs_f64());

    match outcome.error() {
        None => tracing::info!(
            channel,
            attempts = outcome.attempts,
            duration_ms = outcome.total_duration.as_millis() as u64,
            "Notification delivered"
        ),
        Some(err) => tracing::warn!(
            channel,
            attempts = outcome.attempts,
            duration_ms = outcome.total_duration.as_millis() as u64,
            code = %err.code,
            status = err.status_code,
            retryable = err.retryable,
            error = %err,
            "Notification failed"
        ),
    }
}
