use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::admin::auth::password_matches;
use crate::admin::session::{clear_cookie, session_cookie, session_token};
use crate::http::server::AppState;
use crate::notifications::{ChannelSwitches, NotificationJob};
use crate::observability::metrics;
use crate::security::client_id;

/// The single admin account recorded as `updatedBy`.
const ADMIN_USER: &str = "admin";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub jobs: Vec<NotificationJob>,
}

/// JSON `{"error": message}` response.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid Set-Cookie value");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let client = client_id(&headers);

    let decision = state.limiter.check(&client);
    if !decision.allowed {
        let retry_after = decision.retry_after.unwrap_or_default();
        tracing::warn!(client = %client, retry_after, "Login rate limit exceeded");
        metrics::record_login("locked");
        metrics::record_rate_limited("login_lockout");

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": format!(
                    "Too many failed attempts. Please try again in {} minutes.",
                    retry_after.div_ceil(60)
                ),
                "retryAfter": retry_after,
            })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let inner = state.inner.load_full();
    if !password_matches(&request.password, &inner.config.admin.password) {
        state.limiter.record_failed_attempt(&client);
        metrics::record_login("failure");

        let attempts_left = state.limiter.check(&client).attempts_left.unwrap_or(0);
        let message = if attempts_left > 0 {
            format!(
                "Invalid password. {} attempt{} remaining.",
                attempts_left,
                if attempts_left == 1 { "" } else { "s" }
            )
        } else {
            "Too many failed attempts. Account locked for 15 minutes.".to_string()
        };
        return json_error(StatusCode::UNAUTHORIZED, message);
    }

    state.limiter.clear_attempts(&client);
    let ttl = Duration::from_secs(inner.config.admin.session_ttl_secs);
    let token = state.sessions.create(ttl);

    tracing::info!(client = %client, "Successful admin login");
    metrics::record_login("success");

    with_cookie(Json(json!({ "success": true })).into_response(), session_cookie(token, ttl))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(token);
    }
    with_cookie(Json(json!({ "success": true })).into_response(), clear_cookie())
}

pub async fn session_status() -> Json<Value> {
    Json(json!({ "authenticated": true }))
}

/// Accept a batch of notifications and deliver it in the background.
pub async fn dispatch_notifications(
    State(state): State<AppState>,
    body: Result<Json<DispatchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if request.jobs.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "At least one notification job is required");
    }

    let inner = state.inner.load_full();
    let accepted = request.jobs.len();
    tracing::info!(accepted, "Dispatching notification batch");
    // Not awaited: delivery is best-effort.
    drop(inner.notifier.dispatch_in_background(request.jobs, inner.config.retries.policy()));

    (StatusCode::ACCEPTED, Json(json!({ "accepted": accepted }))).into_response()
}

/// Live notification switches next to the configured defaults.
pub async fn get_notification_settings(State(state): State<AppState>) -> Json<Value> {
    let inner = state.inner.load();
    Json(json!({
        "success": true,
        "settings": *state.settings.snapshot(),
        "environmentDefaults": ChannelSwitches::from_config(&inner.config.notifications),
    }))
}

/// Flip notification switches, e.g. `{"smsNotifications": false}`.
pub async fn update_notification_settings(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match state.settings.update(&patch, ADMIN_USER) {
        Ok((settings, changes)) => Json(json!({
            "success": true,
            "message": "Notification settings updated successfully",
            "settings": settings,
            "changes": changes,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected notification settings update");
            json_error(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}
