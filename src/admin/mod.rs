//! Admin API: password login gated by the rate limiter, cookie sessions,
//! notification dispatch, and the runtime notification switches.

pub mod auth;
pub mod handlers;
pub mod session;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub use session::SessionStore;

pub fn setup_admin_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/admin/session", get(session_status))
        .route("/api/admin/notifications", post(dispatch_notifications))
        .route(
            "/api/admin/notification-settings",
            get(get_notification_settings).post(update_notification_settings),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .merge(protected)
        .with_state(state)
}
