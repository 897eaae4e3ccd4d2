//! Bounded fan-out over many notification jobs.

use futures_util::future::join_all;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::notifications::client::{NotificationClient, NotificationJob};
use crate::resilience::{RetryOutcome, RetryPolicy};

/// Jobs dispatched concurrently per group.
pub const BATCH_SIZE: usize = 5;

/// Pause between consecutive groups.
pub const BATCH_PAUSE: Duration = Duration::from_millis(100);

/// Aggregate result of [`NotificationClient::send_batch`].
#[derive(Debug)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
    /// One outcome per job, in input order.
    pub results: Vec<RetryOutcome<Value>>,
}

impl NotificationClient {
    /// Deliver `jobs` in groups of [`BATCH_SIZE`], each group concurrently.
    pub async fn send_batch(&self, jobs: &[NotificationJob], policy: &RetryPolicy) -> BatchReport {
        let mut results = Vec::with_capacity(jobs.len());
        let groups = jobs.chunks(BATCH_SIZE).len();

        for (index, group) in jobs.chunks(BATCH_SIZE).enumerate() {
            let outcomes = join_all(group.iter().map(|job| self.send(job, policy))).await;
            results.extend(outcomes);

            if index + 1 < groups {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        let successful = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - successful;
        tracing::info!(successful, failed, "Notification batch processed");

        BatchReport {
            successful,
            failed,
            results,
        }
    }

    /// Fire-and-forget delivery. Best effort: nothing awaits or persists the
    /// outcome unless the caller keeps the handle.
    pub fn dispatch_in_background(&self, jobs: Vec<NotificationJob>, policy: RetryPolicy) -> JoinHandle<BatchReport> {
        let client = self.clone();
        tokio::spawn(async move { client.send_batch(&jobs, &policy).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationConfig;
    use crate::notifications::Channel;
    use serde_json::json;
    use tokio::time::Instant;

    fn skipping_client() -> NotificationClient {
        NotificationClient::new(
            NotificationConfig {
                email_enabled: false,
                sms_enabled: false,
                ..NotificationConfig::default()
            },
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn jobs(n: usize) -> Vec<NotificationJob> {
        (0..n)
            .map(|i| NotificationJob {
                channel: if i % 2 == 0 { Channel::Email } else { Channel::Sms },
                data: json!({ "seq": i }),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_only_between_groups() {
        let client = skipping_client();
        let policy = RetryPolicy::default();

        let start = Instant::now();
        let report = client.send_batch(&jobs(11), &policy).await;
        assert_eq!(start.elapsed(), BATCH_PAUSE * 2);
        assert_eq!(report.successful, 11);
        assert_eq!(report.failed, 0);
        assert_eq!(report.results.len(), 11);

        let start = Instant::now();
        client.send_batch(&jobs(5), &policy).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn empty_batch_reports_nothing() {
        let report = skipping_client().send_batch(&[], &RetryPolicy::default()).await;
        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 0);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn background_dispatch_can_be_joined() {
        let handle = skipping_client().dispatch_in_background(jobs(3), RetryPolicy::default());
        let report = handle.await.unwrap();
        assert_eq!(report.successful, 3);
    }
}
