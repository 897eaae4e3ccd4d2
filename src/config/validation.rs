//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and addresses.
//! Every problem is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: '{value}' is not an http(s) URL")]
    InvalidEndpoint { field: &'static str, value: String },

    #[error("retries.backoff_multiplier: must be at least 1.0, got {0}")]
    Multiplier(f64),

    #[error("retries.max_delay_ms ({max}) is below retries.base_delay_ms ({base})")]
    DelayOrder { base: u64, max: u64 },

    #[error("admin.password: must not be empty")]
    EmptyPassword,
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.timeouts.delivery_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.delivery_secs" });
    }
    if config.admin.session_ttl_secs == 0 {
        errors.push(ValidationError::Zero { field: "admin.session_ttl_secs" });
    }
    if config.admin.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }

    check_endpoint(&mut errors, "notifications.email_endpoint", &config.notifications.email_endpoint);
    check_endpoint(&mut errors, "notifications.sms_endpoint", &config.notifications.sms_endpoint);

    let retries = &config.retries;
    if !(retries.backoff_multiplier >= 1.0) {
        errors.push(ValidationError::Multiplier(retries.backoff_multiplier));
    }
    if retries.max_delay_ms < retries.base_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: retries.base_delay_ms,
            max: retries.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_endpoint(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ValidationError::InvalidEndpoint {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.retries.backoff_multiplier = 0.5;
        config.notifications.sms_endpoint = "ftp://example".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero { field: "timeouts.request_secs" }));
        assert!(errors.contains(&ValidationError::Multiplier(0.5)));
    }

    #[test]
    fn max_delay_below_base_is_rejected() {
        let mut config = GatewayConfig::default();
        config.retries.base_delay_ms = 5_000;
        config.retries.max_delay_ms = 1_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DelayOrder { base: 5_000, max: 1_000 }]);
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
    }
}
