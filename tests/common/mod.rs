// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use jsonwebtoken::{DecodingKey, EncodingKey};
use nutri_tracker::config::Config;
use nutri_tracker::db::FirestoreDb;
use nutri_tracker::routes::create_router;
use nutri_tracker::services::{GeminiClient, GoogleIdTokenVerifier};
use nutri_tracker::AppState;
use std::sync::Arc;

/// `kid` of the RSA key pair under `tests/fixtures/`.
#[allow(dead_code)]
pub const TEST_KEY_ID: &str = "test-key-1";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Signing key for Google ID tokens minted by tests.
#[allow(dead_code)]
pub fn google_encoding_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(include_bytes!("../fixtures/google_test_key.pem"))
        .expect("valid test private key")
}

/// Google verifier that trusts the fixture key instead of Google's JWKS.
#[allow(dead_code)]
pub fn static_google_verifier(config: &Config) -> GoogleIdTokenVerifier {
    let decoding_key =
        DecodingKey::from_rsa_pem(include_bytes!("../fixtures/google_test_key.pub.pem"))
            .expect("valid test public key");
    GoogleIdTokenVerifier::new_with_static_key(config, TEST_KEY_ID, decoding_key)
        .expect("static verifier")
}

/// Build shared state around a config and database.
#[allow(dead_code)]
pub fn test_state(config: Config, db: FirestoreDb) -> Arc<AppState> {
    let gemini = GeminiClient::new(&config).expect("gemini client");
    let google_verifier = Arc::new(static_google_verifier(&config));
    Arc::new(AppState {
        config,
        db,
        gemini,
        google_verifier,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = test_state(config, test_db_offline());
    (create_router(state.clone()), state)
}

/// Create a test app whose cookies and CORS follow `frontend_url`.
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        frontend_url: frontend_url.to_string(),
        ..Config::test_default()
    };
    create_test_app_with_config(config)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = test_state(config, test_db().await);
    (create_router(state.clone()), state)
}

/// Session token for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    let config = Config::test_default();
    nutri_tracker::middleware::auth::create_jwt(user_id, &config.jwt_signing_key)
        .expect("Failed to create test JWT")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
