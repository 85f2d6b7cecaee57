// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for webhook handling.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn webhook_request(token: Option<&str>, payload: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("X-HOTMART-HOTTOK", token);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn purchase(event: &str) -> Value {
    json!({
        "event": event,
        "data": {
            "buyer": { "email": "buyer@example.com", "name": "Buyer" },
            "product": { "id": 4242 },
            "purchase": { "transaction": "HP0001", "status": "APPROVED" }
        }
    })
}

#[tokio::test]
async fn test_webhook_wrong_token_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(webhook_request(
            Some("wrong"),
            purchase("PURCHASE_APPROVED"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_missing_token_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(webhook_request(None, purchase("PURCHASE_APPROVED")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_token_checked_before_body() {
    for (content_type, body) in [
        ("text/plain", "hello"),
        ("application/json", "{not json"),
        ("application/json", ""),
    ] {
        let (app, _) = common::create_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/webhook")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{content_type} {body:?}"
        );
    }
}

#[tokio::test]
async fn test_webhook_malformed_body_with_valid_token() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webhook")
                .header("X-HOTMART-HOTTOK", state.config.webhook_token.as_str())
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_only_accepts_post() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/webhook")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_webhook_unknown_event_acknowledged() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(webhook_request(
            Some(&state.config.webhook_token),
            purchase("PURCHASE_BILLET_PRINTED"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body, json!({ "received": true, "processed": false }));
}

#[tokio::test]
async fn test_webhook_missing_buyer_email() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(webhook_request(
            Some(&state.config.webhook_token),
            json!({ "event": "PURCHASE_APPROVED", "data": { "product": { "id": 1 } } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_known_event_reaches_database() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(webhook_request(
            Some(&state.config.webhook_token),
            purchase("PURCHASE_APPROVED"),
        ))
        .await
        .unwrap();

    // Offline database: the event is accepted but cannot be stored.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_check_subscription_requires_email() {
    let (app, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/check-subscription")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (app, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/check-subscription")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "email": "  " }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
