//! Public SMS list management: opt-in, STOP/START, preference updates.
//!
//! Subscribing and resubscribing are skipped while the `marketingSms`
//! notification switch is off. Opting out always works.

pub mod handlers;
pub mod store;

use axum::{routing::post, Router};

use self::handlers::{lookup_subscription, manage_subscription};
use crate::http::server::AppState;

pub use store::{normalize_phone, SmsPreferences, SmsSubscription, SubscriptionStore};

pub fn setup_subscription_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/sms-subscription",
            post(manage_subscription).get(lookup_subscription),
        )
        .with_state(state)
}
