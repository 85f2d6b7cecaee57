// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware and session/reset token helpers.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "nutri_token";

/// Session lifetime (30 days).
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// Password reset token lifetime (1 hour).
pub const RESET_TTL_SECS: usize = 60 * 60;

const RESET_KIND: &str = "reset";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Claims of a password reset token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResetClaims {
    /// Subject (lowercased email)
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    /// Always `"reset"`; keeps reset tokens from being used as sessions
    pub kind: String,
    /// Fingerprint of the password hash the token was issued against
    pub fp: String,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let claims =
        verify_jwt(&token, &state.config.jwt_signing_key).map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
    });

    Ok(next.run(request).await)
}

fn now_unix_secs() -> anyhow::Result<usize> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    let now = now_unix_secs()?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Validate a session JWT and return its claims.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> anyhow::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    // Reset tokens share the key; refuse anything carrying a `kind`.
    let data = decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(signing_key),
        &validation,
    )?;
    if data.claims.get("kind").is_some() {
        anyhow::bail!("not a session token");
    }
    Ok(serde_json::from_value(data.claims)?)
}

/// Create a one-hour password reset token bound to the current hash.
pub fn create_reset_token(
    email: &str,
    fingerprint: &str,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    let now = now_unix_secs()?;

    let claims = ResetClaims {
        sub: email.to_string(),
        iat: now,
        exp: now + RESET_TTL_SECS,
        kind: RESET_KIND.to_string(),
        fp: fingerprint.to_string(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Validate a password reset token. The caller still has to compare `fp`
/// against the fingerprint of the stored hash.
pub fn verify_reset_token(token: &str, signing_key: &[u8]) -> anyhow::Result<ResetClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<ResetClaims>(token, &DecodingKey::from_secret(signing_key), &validation)?
        .claims;
    if claims.kind != RESET_KIND {
        anyhow::bail!("not a reset token");
    }
    Ok(claims)
}
