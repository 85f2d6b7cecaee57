// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini model fallback tests against a local fake of the REST API.
//!
//! Each fake model has a scripted list of replies; the last reply repeats
//! once the script runs out.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use nutri_tracker::config::Config;
use nutri_tracker::error::AiErrorKind;
use nutri_tracker::services::{nutrition, GeminiClient};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Reply {
    Text(&'static str),
    Error(StatusCode, &'static str),
}

#[derive(Default)]
struct FakeGemini {
    scripts: HashMap<String, Vec<Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGemini {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

async fn generate_content(
    State(fake): State<Arc<FakeGemini>>,
    Path(call): Path<String>,
) -> axum::response::Response {
    let model = call.trim_end_matches(":generateContent").to_string();
    let attempt = {
        let mut calls = fake.calls.lock().unwrap();
        let attempt = calls.iter().filter(|m| **m == model).count();
        calls.push(model.clone());
        attempt
    };

    let Some(script) = fake.scripts.get(&model) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": format!("models/{model} is not found") } })),
        )
            .into_response();
    };
    let reply = script
        .get(attempt)
        .or(script.last())
        .cloned()
        .unwrap_or(Reply::Error(StatusCode::INTERNAL_SERVER_ERROR, "empty script"));

    match reply {
        Reply::Text(text) => Json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .into_response(),
        Reply::Error(status, message) => {
            (status, Json(json!({ "error": { "message": message } }))).into_response()
        }
    }
}

/// Serve the fake on an ephemeral port and return a client pointed at it.
async fn start_fake(
    models: &[&str],
    scripts: Vec<(&str, Vec<Reply>)>,
) -> (GeminiClient, Arc<FakeGemini>) {
    let fake = Arc::new(FakeGemini {
        scripts: scripts
            .into_iter()
            .map(|(m, s)| (m.to_string(), s))
            .collect(),
        calls: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate_content))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        gemini_base_url: format!("http://{addr}/v1beta"),
        gemini_models: models.iter().map(|m| m.to_string()).collect(),
        quota_retry_delay: Duration::from_millis(10),
        gemini_timeout: Duration::from_secs(5),
        ..Config::test_default()
    };
    (GeminiClient::new(&config).unwrap(), fake)
}

#[tokio::test]
async fn test_first_model_answers() {
    let (client, fake) = start_fake(
        &["model-a", "model-b"],
        vec![("model-a", vec![Reply::Text("hello")])],
    )
    .await;

    let answer = client.generate("hi", None).await.unwrap();
    assert_eq!(answer.text, "hello");
    assert_eq!(answer.model, "model-a");
    assert_eq!(fake.calls(), vec!["model-a"]);
}

#[tokio::test]
async fn test_missing_model_falls_through_to_next() {
    let (client, fake) = start_fake(
        &["retired-model", "model-b"],
        vec![("model-b", vec![Reply::Text("from b")])],
    )
    .await;

    let answer = client.generate("hi", None).await.unwrap();
    assert_eq!(answer.model, "model-b");
    assert_eq!(fake.calls(), vec!["retired-model", "model-b"]);
}

#[tokio::test]
async fn test_quota_error_retries_same_model_once() {
    let (client, fake) = start_fake(
        &["model-a", "model-b"],
        vec![
            (
                "model-a",
                vec![
                    Reply::Error(StatusCode::TOO_MANY_REQUESTS, "Resource has been exhausted"),
                    Reply::Text("after retry"),
                ],
            ),
            ("model-b", vec![Reply::Text("from b")]),
        ],
    )
    .await;

    let answer = client.generate("hi", None).await.unwrap();
    assert_eq!(answer.text, "after retry");
    assert_eq!(fake.calls(), vec!["model-a", "model-a"]);
}

#[tokio::test]
async fn test_persistent_quota_moves_on_after_one_retry() {
    let (client, fake) = start_fake(
        &["model-a", "model-b"],
        vec![
            (
                "model-a",
                vec![Reply::Error(StatusCode::TOO_MANY_REQUESTS, "quota exceeded")],
            ),
            ("model-b", vec![Reply::Text("from b")]),
        ],
    )
    .await;

    let answer = client.generate("hi", None).await.unwrap();
    assert_eq!(answer.model, "model-b");
    assert_eq!(fake.calls(), vec!["model-a", "model-a", "model-b"]);
}

#[tokio::test]
async fn test_all_models_failing_returns_last_error() {
    let (client, fake) = start_fake(
        &["model-a", "model-b"],
        vec![
            (
                "model-a",
                vec![Reply::Error(StatusCode::INTERNAL_SERVER_ERROR, "boom")],
            ),
            (
                "model-b",
                vec![Reply::Error(StatusCode::TOO_MANY_REQUESTS, "quota exceeded")],
            ),
        ],
    )
    .await;

    let err = client.generate("hi", None).await.unwrap_err();
    assert_eq!(err.kind, AiErrorKind::QuotaExceeded);
    assert_eq!(fake.calls(), vec!["model-a", "model-b", "model-b"]);
}

#[tokio::test]
async fn test_text_estimate_through_fake_model() {
    let (client, _) = start_fake(
        &["model-a"],
        vec![(
            "model-a",
            vec![Reply::Text(
                "```json\n{\"foods\":[{\"name\":\"rice\",\"quantity\":\"100g\",\"calories\":130,\"protein\":2.7,\"carbs\":28,\"fat\":0.3},{\"name\":\"beans\",\"quantity\":\"100g\",\"calories\":77,\"protein\":4.5,\"carbs\":14,\"fat\":0.5}]}\n```",
            )],
        )],
    )
    .await;

    let estimate = nutrition::estimate_from_text(&client, "rice and beans")
        .await
        .unwrap();
    assert_eq!(estimate.foods.len(), 2);
    assert_eq!(estimate.total_calories, Some(207.0));
    assert_eq!(estimate.total_carbs, Some(42.0));
}

#[tokio::test]
async fn test_unparseable_answer_is_invalid_response() {
    let (client, _) = start_fake(
        &["model-a"],
        vec![("model-a", vec![Reply::Text("I cannot help with that.")])],
    )
    .await;

    let err = nutrition::estimate_from_text(&client, "rice and beans")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        nutri_tracker::error::AppError::Ai(ref ai) if ai.kind == AiErrorKind::InvalidResponse
    ));
}
