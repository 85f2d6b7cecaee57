// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end HTTP flows against the Firestore emulator.
//!
//! None of these call Gemini: meals are logged with manual totals and
//! AI endpoints are only exercised through the paywall.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use nutri_tracker::config::Config;
use nutri_tracker::middleware::auth::create_reset_token;
use nutri_tracker::services::password::hash_fingerprint;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

struct Client {
    app: Router,
    token: Option<String>,
}

impl Client {
    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request_with_headers(method, uri, body, &[]).await
    }

    async fn request_with_headers(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn unique_email() -> String {
    format!(
        "{}@example.com",
        nutri_tracker::models::user::new_user_id()
    )
}

async fn registered_client(email: &str) -> Client {
    let (app, _) = common::create_emulator_app(Config::test_default()).await;
    let mut client = Client { app, token: None };

    let (status, body) = client
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "email": email, "password": "secret1", "name": "Ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    client.token = Some(body["token"].as_str().unwrap().to_string());
    client
}

#[tokio::test]
async fn test_register_login_and_me() {
    require_emulator!();

    let email = unique_email();
    let client = registered_client(&email).await;

    let (status, me) = client.request("GET", "/api/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], email);
    assert_eq!(me["user"]["has_profile"], false);
    assert_eq!(me["subscription"]["status"], "trial");
    assert_eq!(me["subscription"]["is_premium"], true);
    assert_eq!(me["subscription"]["days_left"], 3);

    // Duplicate registration
    let (status, _) = client
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "email": email.to_uppercase(), "password": "secret1", "name": "Ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let anon = Client {
        app: client.app.clone(),
        token: None,
    };
    let (status, _) = anon
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = anon
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": email, "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(session["token"].is_string());
}

#[tokio::test]
async fn test_profile_diary_and_reports() {
    require_emulator!();

    let client = registered_client(&unique_email()).await;

    let (status, _) = client.request("GET", "/api/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, profile) = client
        .request(
            "PUT",
            "/api/profile",
            Some(json!({
                "age": 30,
                "sex": "M",
                "weight": 80,
                "height": 1.80,
                "activity_level": "moderado",
                "goal": "perder"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["height"], 180.0);
    // Mifflin-St Jeor: 1780 bmr, 2759 tdee, 2259 target
    assert_eq!(profile["calculated"]["target_calories"], 2259);

    let (status, metrics) = client.request("GET", "/api/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["stale"], false);

    let (status, added) = client
        .request(
            "POST",
            "/api/diary/2025-03-01/meals",
            Some(json!({
                "meal_type": "lunch",
                "description": "rice, beans and steak",
                "time": "12:30",
                "totals": { "calories": 750.4, "protein": 45, "carbs": 80, "fat": 22 }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let meal_id = added["meal_id"].as_str().unwrap().to_string();
    assert!(meal_id.starts_with("meal_"));
    assert_eq!(added["day"]["summary"]["total_calories"], 750);

    let (status, report) = client
        .request("GET", "/api/reports/deficit?date=2025-03-01", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["consumed_calories"], 750);
    assert_eq!(report["difference"], 750 - 2259);
    assert_eq!(report["status"], "deficit");

    let (status, week) = client.request("GET", "/api/reports/week", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["days"].as_array().unwrap().len(), 7);

    let (status, day) = client
        .request(
            "DELETE",
            &format!("/api/diary/2025-03-01/meals/{meal_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["summary"]["meal_count"], 0);

    let (status, _) = client
        .request(
            "DELETE",
            &format!("/api/diary/2025-03-01/meals/{meal_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, empty) = client.request("GET", "/api/diary/2024-01-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["meals"], json!([]));
}

#[tokio::test]
async fn test_weight_updates_metrics() {
    require_emulator!();

    let client = registered_client(&unique_email()).await;
    client
        .request(
            "PUT",
            "/api/profile",
            Some(json!({
                "age": 30, "sex": "M", "weight": 80, "height": 180,
                "activity_level": "moderado", "goal": "perder"
            })),
        )
        .await;

    let (status, saved) = client
        .request(
            "POST",
            "/api/weight",
            Some(json!({ "weight": 78, "date": "2025-03-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["profile"]["weight"], 78.0);
    assert_eq!(saved["profile"]["calculated"]["bmr"], 1760);

    let (status, history) = client.request("GET", "/api/weight?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["date"], "2025-03-01");
}

#[tokio::test]
async fn test_webhook_cancel_closes_paywall() {
    require_emulator!();

    let email = unique_email();
    let client = registered_client(&email).await;
    let hottok = Config::test_default().webhook_token;

    let (status, body) = client
        .request_with_headers(
            "POST",
            "/api/webhook",
            Some(json!({
                "event": "PURCHASE_CANCELED",
                "data": { "buyer": { "email": email } }
            })),
            &[("X-HOTMART-HOTTOK", hottok.as_str())],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], true);
    assert_eq!(body["status"], "canceled");

    let (status, body) = client
        .request(
            "POST",
            "/api/nutrition/estimate",
            Some(json!({ "description": "two eggs" })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "payment_required");

    // Manual entries stay free.
    let (status, _) = client
        .request(
            "POST",
            "/api/diary/2025-03-01/meals",
            Some(json!({
                "meal_type": "breakfast",
                "description": "two eggs",
                "totals": { "calories": 150, "protein": 12, "carbs": 1, "fat": 10 }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, check) = client
        .request(
            "GET",
            &format!("/api/check-subscription?email={email}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["active"], false);
    assert_eq!(check["status"], "canceled");
}

#[tokio::test]
async fn test_purchase_before_registration_is_claimed() {
    require_emulator!();

    let email = unique_email();
    let (app, _) = common::create_emulator_app(Config::test_default()).await;
    let anon = Client { app, token: None };
    let hottok = Config::test_default().webhook_token;

    let (status, _) = anon
        .request_with_headers(
            "POST",
            "/api/webhook",
            Some(json!({
                "event": "PURCHASE_APPROVED",
                "data": {
                    "buyer": { "email": email },
                    "product": { "id": 4242 },
                    "purchase": { "transaction": "HP0001" }
                }
            })),
            &[("X-HOTMART-HOTTOK", hottok.as_str())],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, check) = anon
        .request("POST", "/api/check-subscription", Some(json!({ "email": email })))
        .await;
    assert_eq!(check["active"], true);

    let client = registered_client(&email).await;
    let (status, sub) = client.request("GET", "/api/subscription", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["status"], "active");
    assert_eq!(sub["plan"], "4242");
    assert_eq!(sub["is_premium"], true);
}

#[tokio::test]
async fn test_password_reset_flow() {
    require_emulator!();

    let email = unique_email();
    let (app, state) = common::create_emulator_app(Config::test_default()).await;
    let anon = Client { app, token: None };
    anon.request(
        "POST",
        "/auth/register",
        Some(json!({ "email": email, "password": "secret1", "name": "Ana" })),
    )
    .await;

    let credentials = state.db.get_credentials(&email).await.unwrap().unwrap();
    let fingerprint = hash_fingerprint(credentials.password_hash.as_deref().unwrap());
    let token = create_reset_token(&email, &fingerprint, &state.config.jwt_signing_key).unwrap();

    let (status, _) = anon
        .request(
            "POST",
            "/auth/password-reset/confirm",
            Some(json!({ "token": token, "new_password": "secret2" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The hash changed, so the same token no longer works.
    let (status, _) = anon
        .request(
            "POST",
            "/auth/password-reset/confirm",
            Some(json!({ "token": token, "new_password": "secret3" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = anon
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": email, "password": "secret2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_supplements_and_favorites_crud() {
    require_emulator!();

    let client = registered_client(&unique_email()).await;

    let (status, created) = client
        .request(
            "POST",
            "/api/supplements",
            Some(json!({ "name": "Vitamin D", "dosage": "2000 IU" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("sup_"));

    let (status, updated) = client
        .request(
            "PUT",
            &format!("/api/supplements/{id}"),
            Some(json!({ "name": "Vitamin D3", "timing": "morning" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Vitamin D3");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, _) = client
        .request("DELETE", &format!("/api/supplements/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = client
        .request("DELETE", &format!("/api/supplements/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, favorite) = client
        .request(
            "POST",
            "/api/recipes/favorites",
            Some(json!({ "recipe": {
                "name": "Omelette",
                "ingredients": ["2 eggs"],
                "instructions": ["Beat and cook"]
            }})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let favorite_id = favorite["id"].as_str().unwrap().to_string();

    let (_, list) = client.request("GET", "/api/recipes/favorites", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = client
        .request("DELETE", &format!("/api/recipes/favorites/{favorite_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, prefs) = client.request("GET", "/api/preferences", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs, Value::Null);
}
