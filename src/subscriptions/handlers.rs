use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::admin::handlers::json_error;
use crate::http::server::AppState;
use crate::subscriptions::store::{normalize_phone, SmsPreferences, Subscriber};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    #[serde(default)]
    pub marketing: bool,
    #[serde(default)]
    pub service_updates: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub customer: Customer,
    pub preferences: Option<PreferenceUpdate>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub phone: Option<String>,
}

fn marketing_disabled() -> Response {
    Json(json!({
        "success": true,
        "message": "SMS marketing is disabled",
        "skipped": true,
    }))
    .into_response()
}

/// `POST /api/sms-subscription`: subscribe, unsubscribe/stop, start, or
/// update_preferences for one phone number.
pub async fn manage_subscription(
    State(state): State<AppState>,
    body: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    if request.customer.phone.is_empty() || request.action.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Phone number and action are required");
    }
    let Some(phone) = normalize_phone(&request.customer.phone) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid phone number format");
    };

    let who = Subscriber {
        first_name: request.customer.first_name,
        last_name: request.customer.last_name,
        source: request.source,
    };
    let store = &state.subscriptions;
    let marketing_enabled = state.settings.marketing_sms_enabled();

    match request.action.as_str() {
        "subscribe" => {
            if !marketing_enabled {
                return marketing_disabled();
            }
            let preferences = request.preferences.map(|p| SmsPreferences {
                transactional: true,
                marketing: p.marketing,
                service_updates: p.service_updates,
            });
            let record = store.subscribe(&phone, &who, preferences);
            Json(json!({
                "success": true,
                "message": "Successfully subscribed to SMS list. Reply STOP to opt out anytime.",
                "preferences": record.preferences,
                "helpMessage": "Msg & data rates may apply. Reply HELP for help, STOP to opt out.",
            }))
            .into_response()
        }
        "unsubscribe" | "stop" => {
            let record = store.unsubscribe(&phone, &who);
            Json(json!({
                "success": true,
                "message": "You have been unsubscribed from marketing SMS. You may still receive important service-related messages.",
                "preferences": record.preferences,
                "confirmationMessage": "STOP confirmed. You will no longer receive marketing messages.",
            }))
            .into_response()
        }
        "start" => {
            if !marketing_enabled {
                return marketing_disabled();
            }
            let record = store.resubscribe(&phone, &who);
            Json(json!({
                "success": true,
                "message": "You have been resubscribed to SMS notifications.",
                "preferences": record.preferences,
                "confirmationMessage": "Welcome back! You will now receive SMS updates. Reply STOP to opt out anytime.",
            }))
            .into_response()
        }
        "update_preferences" => {
            let Some(update) = request.preferences else {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    "Preferences object is required for update_preferences action",
                );
            };
            let record =
                store.update_preferences(&phone, &who, update.marketing, update.service_updates);
            Json(json!({
                "success": true,
                "message": "SMS preferences updated successfully",
                "preferences": record.preferences,
            }))
            .into_response()
        }
        _ => json_error(
            StatusCode::BAD_REQUEST,
            "Invalid action. Must be subscribe, unsubscribe, stop, start, or update_preferences",
        ),
    }
}

/// `GET /api/sms-subscription?phone=...`
pub async fn lookup_subscription(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let Some(raw) = query.phone.filter(|p| !p.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "Phone parameter is required");
    };
    let Some(phone) = normalize_phone(&raw) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid phone number format");
    };

    let body = match state.subscriptions.get(&phone) {
        None => json!({
            "success": true,
            "subscribed": false,
            "preferences": SmsPreferences::OPTED_OUT,
        }),
        Some(record) => {
            let mut body = json!({ "success": true, "subscribed": true });
            if let (Value::Object(body), Ok(Value::Object(fields))) =
                (&mut body, serde_json::to_value(&record))
            {
                body.extend(fields);
            }
            body
        }
    };
    Json(body).into_response()
}
