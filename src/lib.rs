// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nutri-Tracker: nutrition diary backend
//!
//! This crate provides the backend API for logging meals, estimating their
//! nutrition with Gemini, tracking body weight and computing daily energy
//! targets, behind a trial/subscription paywall.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{GeminiClient, GoogleIdTokenVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub gemini: GeminiClient,
    pub google_verifier: Arc<GoogleIdTokenVerifier>,
}
