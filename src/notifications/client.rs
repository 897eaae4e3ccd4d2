//! HTTP delivery of email and SMS notifications.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::NotificationConfig;
use crate::notifications::error::{ErrorCode, NotificationError};
use crate::notifications::settings::SettingsStore;
use crate::observability::metrics;
use crate::resilience::{with_retry, RetryOutcome, RetryPolicy};

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::Sms => "SMS",
        }
    }

    fn operation_name(self) -> &'static str {
        match self {
            Channel::Email => "Email Notification",
            Channel::Sms => "SMS Notification",
        }
    }

    fn failure_code(self) -> ErrorCode {
        match self {
            Channel::Email => ErrorCode::EmailSendFailed,
            Channel::Sms => ErrorCode::SmsSendFailed,
        }
    }
}

/// One notification to deliver. `data` is forwarded to the channel endpoint as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    #[serde(rename = "type")]
    pub channel: Channel,
    pub data: Value,
}

/// Client for the email and SMS delivery endpoints.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    http: reqwest::Client,
    config: NotificationConfig,
    settings: Arc<SettingsStore>,
}

impl NotificationClient {
    /// Build a client whose individual calls time out after `timeout`.
    pub fn new(config: NotificationConfig, timeout: Duration) -> Result<Self, NotificationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                NotificationError::new(
                    format!("failed to build HTTP client: {e}"),
                    ErrorCode::ConfigurationError,
                    500,
                    false,
                )
                .with_source(e)
            })?;
        Ok(Self::with_http_client(http, config))
    }

    /// Channel switches are seeded from `config` until [`Self::with_settings`]
    /// attaches a shared store.
    pub fn with_http_client(http: reqwest::Client, config: NotificationConfig) -> Self {
        let settings = Arc::new(SettingsStore::from_config(&config));
        Self { http, config, settings }
    }

    pub fn with_settings(mut self, settings: Arc<SettingsStore>) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub async fn send_email<P>(&self, payload: &P, policy: &RetryPolicy) -> RetryOutcome<Value>
    where
        P: Serialize + ?Sized,
    {
        self.deliver(Channel::Email, payload, policy).await
    }

    pub async fn send_sms<P>(&self, payload: &P, policy: &RetryPolicy) -> RetryOutcome<Value>
    where
        P: Serialize + ?Sized,
    {
        self.deliver(Channel::Sms, payload, policy).await
    }

    pub async fn send(&self, job: &NotificationJob, policy: &RetryPolicy) -> RetryOutcome<Value> {
        self.deliver(job.channel, &job.data, policy).await
    }

    fn enabled(&self, channel: Channel) -> bool {
        self.settings.is_enabled(channel)
    }

    fn endpoint(&self, channel: Channel) -> &str {
        match channel {
            Channel::Email => &self.config.email_endpoint,
            Channel::Sms => &self.config.sms_endpoint,
        }
    }

    async fn deliver<P>(&self, channel: Channel, payload: &P, policy: &RetryPolicy) -> RetryOutcome<Value>
    where
        P: Serialize + ?Sized,
    {
        if !self.enabled(channel) {
            tracing::info!(channel = channel.as_str(), "Channel disabled, skipping notification");
            return RetryOutcome {
                result: Ok(json!({
                    "success": true,
                    "skipped": true,
                    "message": format!("{} notifications are disabled", channel.label()),
                })),
                attempts: 0,
                total_duration: Duration::ZERO,
            };
        }

        let endpoint = self.endpoint(channel);
        let outcome = with_retry(
            || self.post_once(channel, endpoint, payload),
            policy,
            channel.operation_name(),
        )
        .await;

        metrics::record_notification(channel.as_str(), &outcome);
        outcome
    }

    async fn post_once<P>(&self, channel: Channel, endpoint: &str, payload: &P) -> Result<Value, NotificationError>
    where
        P: Serialize + ?Sized,
    {
        let response = self.http.post(endpoint).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_owned());

            return Err(NotificationError::from_status(
                format!("{} notification failed: {}", channel.label(), detail),
                channel.failure_code(),
                status.as_u16(),
            ));
        }

        // A delivered notification must not be retried because its
        // acknowledgement body is not JSON.
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> NotificationConfig {
        NotificationConfig {
            email_enabled: false,
            sms_enabled: false,
            ..NotificationConfig::default()
        }
    }

    #[test]
    fn jobs_use_type_and_data_fields() {
        let job: NotificationJob =
            serde_json::from_value(json!({ "type": "sms", "data": { "phone": "+15550100" } })).unwrap();
        assert_eq!(job.channel, Channel::Sms);
        assert_eq!(job.data["phone"], "+15550100");

        let back = serde_json::to_value(&job).unwrap();
        assert_eq!(back["type"], "sms");
    }

    #[tokio::test]
    async fn disabled_channel_is_skipped_without_calls() {
        let client = NotificationClient::new(disabled_config(), Duration::from_secs(1)).unwrap();
        let outcome = client.send_sms(&json!({}), &RetryPolicy::default()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts, 0);
        let body = outcome.result.unwrap();
        assert_eq!(body["skipped"], true);
        assert_eq!(body["message"], "SMS notifications are disabled");
    }

    #[tokio::test]
    async fn shared_settings_switch_channels_at_runtime() {
        let client = NotificationClient::new(NotificationConfig::default(), Duration::from_secs(1))
            .unwrap()
            .with_settings(Arc::new(SettingsStore::from_config(&disabled_config())));
        let outcome = client.send_email(&json!({}), &RetryPolicy::default()).await;
        assert_eq!(outcome.attempts, 0);

        client
            .settings()
            .update(&json!({ "emailNotifications": true }), "admin")
            .unwrap();
        assert!(client.settings().is_enabled(Channel::Email));
        assert!(!client.settings().is_enabled(Channel::Sms));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_retried_then_reported() {
        let config = NotificationConfig {
            // Port 9 (discard) is closed on test hosts; connection is refused.
            email_endpoint: "http://127.0.0.1:9/email".into(),
            ..NotificationConfig::default()
        };
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = NotificationClient::with_http_client(http, config);
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        };

        let outcome = client.send_email(&json!({ "to": "a@b.c" }), &policy).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts, 3);
        let err = outcome.error().unwrap();
        assert!(err.retryable);
        assert_eq!(err.code, ErrorCode::UnknownError);
    }
}
