// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nutri-Tracker API Server
//!
//! Food diary backend: logs meals, estimates their nutrition with Gemini,
//! tracks body weight and derives daily energy targets.

use nutri_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{GeminiClient, GoogleIdTokenVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Nutri-Tracker API");

    if config.premium_override {
        tracing::warn!("PREMIUM_OVERRIDE is on: every user has premium access");
    }

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let gemini = GeminiClient::new(&config)?;
    tracing::info!(models = ?gemini.models(), "Gemini client initialized");

    let google_verifier = Arc::new(GoogleIdTokenVerifier::new(&config)?);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        gemini,
        google_verifier,
    });

    // Build router
    let app = nutri_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nutri_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
