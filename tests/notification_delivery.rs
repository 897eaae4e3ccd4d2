//! Delivery tests against a live mock notification endpoint.

use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use membership_gateway::notifications::{Channel, ErrorCode, NotificationJob};

mod common;

#[tokio::test]
async fn test_retry_until_endpoint_recovers() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                (503, json!({ "error": "busy" }).to_string())
            } else {
                (200, json!({ "id": "msg-1" }).to_string())
            }
        }
    })
    .await;

    let client = common::client_for(addr);
    let outcome = client
        .send_email(&json!({ "to": "member@example.com" }), &common::fast_policy(3))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(call_count.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.result.unwrap()["id"], "msg-1");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let addr = common::start_programmable_backend(move || {
        cc.fetch_add(1, Ordering::SeqCst);
        async { (400, json!({ "error": "Invalid phone number" }).to_string()) }
    })
    .await;

    let client = common::client_for(addr);
    let outcome = client
        .send_sms(&json!({ "phone": "not-a-number" }), &common::fast_policy(3))
        .await;

    assert_eq!(outcome.attempts, 1);
    assert_eq!(call_count.load(Ordering::SeqCst), 1);

    let error = outcome.error().unwrap();
    assert!(!error.retryable);
    assert_eq!(error.status_code, 400);
    assert_eq!(error.code, ErrorCode::SmsSendFailed);
    assert!(error.message.contains("Invalid phone number"));
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let addr = common::start_programmable_backend(move || {
        cc.fetch_add(1, Ordering::SeqCst);
        async { (500, "{}".to_string()) }
    })
    .await;

    let client = common::client_for(addr);
    let outcome = client
        .send_email(&json!({ "to": "member@example.com" }), &common::fast_policy(2))
        .await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(call_count.load(Ordering::SeqCst), 3);

    let error = outcome.error().unwrap();
    assert!(error.retryable);
    assert_eq!(error.status_code, 500);
    assert!(error.message.contains("Internal Server Error"));
}

#[tokio::test]
async fn test_mixed_batch_counts_outcomes() {
    // Every third request fails with a client error.
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let addr = common::start_programmable_backend(move || {
        let count = cc.fetch_add(1, Ordering::SeqCst);
        async move {
            if count % 3 == 2 {
                (400, json!({ "error": "rejected" }).to_string())
            } else {
                (200, json!({ "ok": true }).to_string())
            }
        }
    })
    .await;

    let client = common::client_for(addr);
    let jobs: Vec<NotificationJob> = (0..6)
        .map(|i| NotificationJob {
            channel: if i % 2 == 0 { Channel::Email } else { Channel::Sms },
            data: json!({ "seq": i }),
        })
        .collect();

    let report = client.send_batch(&jobs, &common::fast_policy(0)).await;

    assert_eq!(report.results.len(), 6);
    assert_eq!(report.successful, 4);
    assert_eq!(report.failed, 2);
    assert_eq!(call_count.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_background_dispatch_reports_when_done() {
    let addr = common::start_programmable_backend(|| async { (200, "{}".to_string()) }).await;

    let client = common::client_for(addr);
    let jobs = vec![
        NotificationJob { channel: Channel::Email, data: json!({ "to": "a@example.com" }) },
        NotificationJob { channel: Channel::Sms, data: json!({ "phone": "+15550100" }) },
    ];

    let report = client
        .dispatch_in_background(jobs, common::fast_policy(1))
        .await
        .unwrap();
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_batch_groups_run_concurrently_up_to_five() {
    let in_flight = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));
    let (current, max) = (in_flight.clone(), peak.clone());
    let addr = common::start_programmable_backend(move || {
        let current = current.clone();
        let max = max.clone();
        async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            max.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            (200, "{}".to_string())
        }
    })
    .await;

    let client = common::client_for(addr);
    let jobs: Vec<NotificationJob> = (0..12)
        .map(|i| NotificationJob {
            channel: Channel::Email,
            data: json!({ "seq": i }),
        })
        .collect();

    let report = client.send_batch(&jobs, &common::fast_policy(0)).await;

    assert_eq!(report.successful, 12);
    assert_eq!(peak.load(Ordering::SeqCst), 5);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}
