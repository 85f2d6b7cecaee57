// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment provider (Hotmart) webhook and the public subscription check.

use crate::error::{AppError, Result};
use crate::models::{user::normalize_email, SubscriptionRecord, SubscriptionStatus};
use crate::services::subscription;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the shared webhook token.
pub const HOTTOK_HEADER: &str = "x-hotmart-hottok";

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/webhook", post(handle_event))
        .route(
            "/api/check-subscription",
            get(check_subscription_query).post(check_subscription_body),
        )
}

/// Hotmart event envelope. Only the fields used here are modelled.
#[derive(Deserialize, Debug)]
struct WebhookEvent {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Deserialize, Debug, Default)]
struct EventData {
    #[serde(default)]
    buyer: Option<Buyer>,
    #[serde(default)]
    product: Option<Product>,
    #[serde(default)]
    purchase: Option<Purchase>,
}

#[derive(Deserialize, Debug)]
struct Buyer {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Product {
    /// Numeric in practice; kept as raw JSON and stringified
    #[serde(default)]
    id: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct Purchase {
    #[serde(default)]
    transaction: Option<String>,
}

/// What an event does to the buyer's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventAction {
    Activate,
    Set(SubscriptionStatus),
}

fn classify_event(event: &str) -> Option<EventAction> {
    match event {
        "PURCHASE_COMPLETE" | "PURCHASE_APPROVED" => Some(EventAction::Activate),
        "PURCHASE_CANCELED" | "PURCHASE_REFUNDED" | "PURCHASE_CHARGEBACK" => {
            Some(EventAction::Set(SubscriptionStatus::Canceled))
        }
        "PURCHASE_EXPIRED" => Some(EventAction::Set(SubscriptionStatus::Expired)),
        _ => None,
    }
}

fn token_matches(headers: &HeaderMap, expected: &str) -> bool {
    let Some(received) = headers.get(HOTTOK_HEADER).and_then(|h| h.to_str().ok()) else {
        return false;
    };
    !expected.is_empty() && bool::from(received.as_bytes().ct_eq(expected.as_bytes()))
}

fn product_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Apply an event on top of the buyer's current record (if any).
fn apply_event(
    current: Option<SubscriptionRecord>,
    event: &WebhookEvent,
    action: EventAction,
    buyer_email: &str,
    now: &str,
) -> SubscriptionRecord {
    let mut record = current.unwrap_or_else(|| SubscriptionRecord {
        status: SubscriptionStatus::None,
        plan: None,
        created_at: now.to_string(),
        trial_end: None,
        expires_at: None,
        updated_at: now.to_string(),
        buyer_email: None,
        transaction: None,
        last_event: None,
    });

    match action {
        EventAction::Activate => {
            record.status = SubscriptionStatus::Active;
            record.expires_at = None;
            if let Some(id) = event.data.product.as_ref().and_then(|p| p.id.as_ref()) {
                record.plan = Some(product_id(id));
            }
            if let Some(tx) = event
                .data
                .purchase
                .as_ref()
                .and_then(|p| p.transaction.clone())
            {
                record.transaction = Some(tx);
            }
        }
        EventAction::Set(status) => record.status = status,
    }

    record.buyer_email = Some(buyer_email.to_string());
    record.last_event = Some(event.event.clone());
    record.updated_at = now.to_string();
    record
}

#[derive(Serialize)]
struct WebhookResponse {
    received: bool,
    processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<SubscriptionStatus>,
}

/// Handle a payment event (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    // Authenticate before looking at the body at all.
    if !token_matches(&headers, &state.config.webhook_token) {
        tracing::warn!("Security Alert: webhook token mismatch");
        return Err(AppError::Unauthorized);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed event: {}", e)))?;

    let Some(action) = classify_event(&event.event) else {
        tracing::info!(event = %event.event, "Ignoring webhook event");
        return Ok(Json(WebhookResponse {
            received: true,
            processed: false,
            status: None,
        }));
    };

    let buyer_email = event
        .data
        .buyer
        .as_ref()
        .and_then(|b| b.email.as_deref())
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing buyer email".to_string()))?;

    let now = format_utc_rfc3339(Utc::now());
    let user_id = state
        .db
        .get_credentials(&buyer_email)
        .await?
        .map(|c| c.user_id);

    let record = match &user_id {
        Some(user_id) => {
            let current = state.db.get_subscription(user_id).await?;
            let record = apply_event(current, &event, action, &buyer_email, &now);
            state.db.set_subscription(user_id, &record).await?;
            record
        }
        None => {
            let current = state.db.get_pending_subscription(&buyer_email).await?;
            let record = apply_event(current, &event, action, &buyer_email, &now);
            state
                .db
                .set_pending_subscription(&buyer_email, &record)
                .await?;
            record
        }
    };

    tracing::info!(
        event = %event.event,
        user_id = user_id.as_deref().unwrap_or("<pending>"),
        status = ?record.status,
        "Webhook event applied"
    );

    Ok(Json(WebhookResponse {
        received: true,
        processed: true,
        status: Some(record.status),
    }))
}

#[derive(Deserialize, Default)]
struct EmailParams {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct CheckSubscriptionResponse {
    email: String,
    active: bool,
    status: SubscriptionStatus,
    message: &'static str,
}

async fn check_subscription_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EmailParams>,
) -> Result<Json<CheckSubscriptionResponse>> {
    check_subscription(&state, params.email).await
}

/// POST accepts the email in a JSON body or, failing that, the query.
async fn check_subscription_body(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EmailParams>,
    body: Bytes,
) -> Result<Json<CheckSubscriptionResponse>> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<EmailParams>(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?
            .email
    };
    check_subscription(&state, from_body.or(params.email)).await
}

async fn check_subscription(
    state: &AppState,
    email: Option<String>,
) -> Result<Json<CheckSubscriptionResponse>> {
    let email = email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("email is required".to_string()))?;

    let record = match state.db.get_credentials(&email).await? {
        Some(credentials) => state.db.get_subscription(&credentials.user_id).await?,
        None => state.db.get_pending_subscription(&email).await?,
    };
    let access = subscription::evaluate(
        record.as_ref(),
        Utc::now(),
        state.config.premium_override,
    );

    Ok(Json(CheckSubscriptionResponse {
        email,
        active: access.is_premium,
        status: access.status,
        message: subscription::status_message(&access),
    }))
}
