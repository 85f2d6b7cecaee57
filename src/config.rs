// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! On Cloud Run, secrets are injected as environment variables through
//! secret bindings, so everything is read once at startup.

use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::time::Duration;

/// Gemini models tried in order until one answers.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-1.0-pro",
];

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin and cookie domain)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Google OAuth client ID accepted as ID token audience.
    /// Empty disables Google sign-in.
    pub google_client_id: String,
    /// Gemini model identifiers in fallback order
    pub gemini_models: Vec<String>,
    /// Gemini REST endpoint base
    pub gemini_base_url: String,
    /// Pause before retrying a model that reported a quota error
    pub quota_retry_delay: Duration,
    /// Per-request timeout for Gemini calls
    pub gemini_timeout: Duration,
    /// Length of the free trial granted at registration
    pub trial_days: i64,
    /// Offset used to decide which calendar day a meal belongs to
    pub diary_utc_offset: FixedOffset,
    /// Grants premium access to everyone (support/testing switch)
    pub premium_override: bool,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Gemini API key
    pub gemini_api_key: String,
    /// Shared token sent by the payment provider with each webhook
    pub webhook_token: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            gemini_models: DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            quota_retry_delay: Duration::from_millis(1000),
            gemini_timeout: Duration::from_secs(60),
            trial_days: 3,
            diary_utc_offset: sao_paulo_offset(),
            premium_override: false,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            gemini_api_key: "test_gemini_key".to_string(),
            webhook_token: "test_hottok".to_string(),
        }
    }
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gemini_models = match env::var("GEMINI_MODELS") {
            Ok(raw) => parse_model_list(&raw)?,
            Err(_) => DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        let diary_utc_offset = match env::var("DIARY_UTC_OFFSET_HOURS") {
            Ok(raw) => parse_utc_offset(&raw)?,
            Err(_) => sao_paulo_offset(),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            gemini_models,
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            quota_retry_delay: Duration::from_millis(parse_or("GEMINI_QUOTA_RETRY_MS", 1000)?),
            gemini_timeout: Duration::from_secs(parse_or("GEMINI_TIMEOUT_SECS", 60)?),
            trial_days: parse_or("TRIAL_DAYS", 3)?,
            diary_utc_offset,
            premium_override: env::var("PREMIUM_OVERRIDE")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
            webhook_token: env::var("HOTMART_HOTTOK")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("HOTMART_HOTTOK"))?,
        })
    }

    /// Whether Google sign-in is configured.
    pub fn google_sign_in_enabled(&self) -> bool {
        !self.google_client_id.is_empty()
    }
}

fn sao_paulo_offset() -> FixedOffset {
    // UTC-3, no DST since 2019.
    FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| Utc.fix())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

fn parse_model_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    if models.is_empty() {
        return Err(ConfigError::Invalid("GEMINI_MODELS"));
    }
    Ok(models)
}

fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let hours: i32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid("DIARY_UTC_OFFSET_HOURS"))?;
    FixedOffset::east_opt(hours * 3600).ok_or(ConfigError::Invalid("DIARY_UTC_OFFSET_HOURS"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("GEMINI_API_KEY", " key-with-space ");
        env::set_var("HOTMART_HOTTOK", "hottok");
        env::set_var("GEMINI_MODELS", "model-a, model-b,,");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.gemini_api_key, "key-with-space");
        assert_eq!(config.webhook_token, "hottok");
        assert_eq!(config.gemini_models, vec!["model-a", "model-b"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.trial_days, 3);
        assert!(!config.premium_override);

        env::remove_var("GEMINI_MODELS");
    }

    #[test]
    fn test_default_models_in_fallback_order() {
        let config = Config::default();
        assert_eq!(config.gemini_models.first().unwrap(), "gemini-2.0-flash");
        assert_eq!(config.gemini_models.last().unwrap(), "gemini-1.0-pro");
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("-3").unwrap().local_minus_utc(), -3 * 3600);
        assert_eq!(parse_utc_offset("2").unwrap().local_minus_utc(), 2 * 3600);
        assert!(parse_utc_offset("abc").is_err());
        assert!(parse_utc_offset("30").is_err());
    }

    #[test]
    fn test_parse_model_list_rejects_empty() {
        assert!(matches!(
            parse_model_list(" , "),
            Err(ConfigError::Invalid("GEMINI_MODELS"))
        ));
    }
}
