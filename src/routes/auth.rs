// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account authentication routes: email/password, Google sign-in and
//! password reset.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_jwt, create_reset_token, verify_reset_token, SESSION_COOKIE, SESSION_TTL_SECS,
};
use crate::models::{
    user::{new_user_id, normalize_email},
    AuthProvider, Credentials, SubscriptionRecord, User,
};
use crate::routes::api::UserResponse;
use crate::services::{password, OidcError};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

/// Non-HttpOnly cookie telling the frontend a session exists.
pub const LOGGED_IN_COOKIE: &str = "nutri_logged_in";

const MAX_NAME_CHARS: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_sign_in))
        .route("/auth/logout", post(logout))
        .route("/auth/password-reset/request", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

// ─── Password hashing off the async runtime ─────────────────

/// Hash a password on the blocking pool; argon2 is deliberately slow.
pub(crate) async fn hash_password_blocking(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task failed: {}", e)))?
        .map_err(AppError::Internal)
}

pub(crate) async fn verify_password_blocking(plain: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task failed: {}", e)))?
        .map_err(AppError::Internal)
}

/// Same cost as [`verify_password_blocking`], for logins with no stored hash.
async fn verify_decoy_blocking(plain: String) -> Result<()> {
    tokio::task::spawn_blocking(move || password::verify_decoy(&plain))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task failed: {}", e)))
}

// ─── Session cookies ─────────────────────────────────────────

fn cookies_secure(config: &Config) -> bool {
    config.frontend_url.starts_with("https://")
}

fn session_cookies(config: &Config, token: &str, max_age: time::Duration) -> [Cookie<'static>; 2] {
    let secure = cookies_secure(config);
    let session = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();
    let hint_value = if token.is_empty() { "" } else { "1" };
    let hint = Cookie::build((LOGGED_IN_COOKIE, hint_value))
        .path("/")
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();
    [session, hint]
}

/// Session token plus the user it belongs to.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, SessionResponse)> {
    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let [session, hint] = session_cookies(
        &state.config,
        &token,
        time::Duration::seconds(SESSION_TTL_SECS as i64),
    );
    let jar = jar.add(session).add(hint);

    Ok((
        jar,
        SessionResponse {
            token,
            user: UserResponse::from(user),
        },
    ))
}

fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "name must be 1 to {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

// ─── Email/password ──────────────────────────────────────────

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    name: String,
}

/// Create a password account with a fresh free trial.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let email = normalize_email(&body.email);
    if !password::is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email address".to_string()));
    }
    password::validate_password(&body.password).map_err(AppError::BadRequest)?;
    let name = validate_name(&body.name)?;

    let now = Utc::now();
    let now_str = format_utc_rfc3339(now);
    let password_hash = hash_password_blocking(body.password).await?;

    let user = User {
        id: new_user_id(),
        email: email.clone(),
        name,
        auth_provider: AuthProvider::Password,
        google_subject: None,
        profile: None,
        created_at: now_str.clone(),
        last_active: now_str.clone(),
    };
    let credentials = Credentials {
        user_id: user.id.clone(),
        email,
        password_hash: Some(password_hash),
        updated_at: now_str,
    };

    let account = state
        .db
        .create_account(
            user,
            credentials,
            SubscriptionRecord::new_trial(now, state.config.trial_days),
        )
        .await?;

    tracing::info!(
        user_id = %account.user.id,
        claimed_pending = account.claimed_pending,
        status = ?account.subscription.status,
        "Account registered"
    );

    let (jar, session) = start_session(&state, jar, &account.user)?;
    Ok((StatusCode::CREATED, jar, Json(session)))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let email = normalize_email(&body.email);

    // Unknown email, Google-only account and wrong password all look alike.
    let credentials = state.db.get_credentials(&email).await?;
    let Some((user_id, hash)) =
        credentials.and_then(|c| c.password_hash.map(|h| (c.user_id, h)))
    else {
        verify_decoy_blocking(body.password).await?;
        return Err(AppError::Unauthorized);
    };
    if !verify_password_blocking(body.password, hash).await? {
        tracing::info!(user_id = %user_id, "Login with wrong password");
        return Err(AppError::Unauthorized);
    }

    let mut user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    user.last_active = format_utc_rfc3339(Utc::now());
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    let (jar, session) = start_session(&state, jar, &user)?;
    Ok((jar, Json(session)))
}

// ─── Google sign-in ──────────────────────────────────────────

#[derive(Deserialize)]
struct GoogleSignInRequest {
    id_token: String,
}

/// Sign in with a Google ID token, linking or creating the account.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let identity = state
        .google_verifier
        .verify_id_token(&body.id_token)
        .await
        .map_err(|e| match e {
            OidcError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Google ID token rejected");
                AppError::InvalidToken
            }
            OidcError::Disabled => {
                AppError::BadRequest("Google sign-in is not enabled".to_string())
            }
            OidcError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("Google key fetch failed: {}", reason))
            }
        })?;

    let now = Utc::now();
    let now_str = format_utc_rfc3339(now);

    let existing = match state.db.get_credentials(&identity.email).await? {
        Some(credentials) => state
            .db
            .get_user(&credentials.user_id)
            .await?
            .map(|user| (user, credentials)),
        None => None,
    };

    let user = match existing {
        Some((mut user, mut credentials)) => {
            match user.google_subject.as_deref() {
                Some(subject) if subject != identity.subject => {
                    tracing::warn!(
                        user_id = %user.id,
                        "Google subject does not match linked account"
                    );
                    return Err(AppError::Unauthorized);
                }
                Some(_) => {}
                None => {
                    // Registration never proved ownership of the email; Google
                    // just did. A password set by someone else must not survive.
                    tracing::info!(
                        user_id = %user.id,
                        had_password = credentials.password_hash.is_some(),
                        "Linking Google account"
                    );
                    user.google_subject = Some(identity.subject.clone());
                    user.auth_provider = AuthProvider::Google;
                    if credentials.password_hash.take().is_some() {
                        credentials.updated_at = now_str.clone();
                        state.db.set_credentials(&credentials).await?;
                    }
                }
            }
            user.last_active = now_str;
            state.db.upsert_user(&user).await?;
            user
        }
        None => {
            let user = User {
                id: new_user_id(),
                email: identity.email.clone(),
                name: identity
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| identity.email.clone()),
                auth_provider: AuthProvider::Google,
                google_subject: Some(identity.subject.clone()),
                profile: None,
                created_at: now_str.clone(),
                last_active: now_str.clone(),
            };
            let credentials = Credentials {
                user_id: user.id.clone(),
                email: identity.email.clone(),
                password_hash: None,
                updated_at: now_str,
            };
            let account = state
                .db
                .create_account(
                    user,
                    credentials,
                    SubscriptionRecord::new_trial(now, state.config.trial_days),
                )
                .await?;
            tracing::info!(
                user_id = %account.user.id,
                claimed_pending = account.claimed_pending,
                "Account created with Google"
            );
            account.user
        }
    };

    let (jar, session) = start_session(&state, jar, &user)?;
    Ok((jar, Json(session)))
}

/// Clear the session cookies. Tokens are stateless, so nothing else changes.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    let [session, hint] = session_cookies(&state.config, "", time::Duration::ZERO);
    (StatusCode::NO_CONTENT, jar.add(session).add(hint))
}

// ─── Password reset ──────────────────────────────────────────

#[derive(Deserialize)]
struct ResetRequest {
    email: String,
}

#[derive(Serialize)]
struct ResetRequestResponse {
    message: &'static str,
}

/// Issue a reset link. Always answers 202 so emails cannot be probed.
async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetRequest>,
) -> Result<(StatusCode, Json<ResetRequestResponse>)> {
    let email = normalize_email(&body.email);
    let response = (
        StatusCode::ACCEPTED,
        Json(ResetRequestResponse {
            message: "If the account exists, a reset link has been sent",
        }),
    );

    if !password::is_valid_email(&email) {
        return Ok(response);
    }
    let Some(credentials) = state.db.get_credentials(&email).await? else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(response);
    };

    let fingerprint =
        password::hash_fingerprint(credentials.password_hash.as_deref().unwrap_or_default());
    let token = create_reset_token(&email, &fingerprint, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("reset token creation failed: {}", e)))?;

    // No mail transport is configured; the link goes to the operator log.
    let link = format!(
        "{}/reset-password?token={}",
        state.config.frontend_url.trim_end_matches('/'),
        token
    );
    tracing::info!(user_id = %credentials.user_id, reset_link = %link, "Password reset issued");

    Ok(response)
}

#[derive(Deserialize)]
struct ResetConfirm {
    token: String,
    new_password: String,
}

/// Set a new password with a reset token. The token stops working once
/// the password changes.
async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetConfirm>,
) -> Result<StatusCode> {
    let claims = verify_reset_token(&body.token, &state.config.jwt_signing_key)
        .map_err(|_| AppError::InvalidToken)?;
    password::validate_password(&body.new_password).map_err(AppError::BadRequest)?;

    let mut credentials = state
        .db
        .get_credentials(&claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;

    let current =
        password::hash_fingerprint(credentials.password_hash.as_deref().unwrap_or_default());
    if !bool::from(current.as_bytes().ct_eq(claims.fp.as_bytes())) {
        tracing::info!(user_id = %credentials.user_id, "Stale password reset token");
        return Err(AppError::InvalidToken);
    }

    credentials.password_hash = Some(hash_password_blocking(body.new_password).await?);
    credentials.updated_at = format_utc_rfc3339(Utc::now());
    state.db.set_credentials(&credentials).await?;

    tracing::info!(user_id = %credentials.user_id, "Password reset completed");
    Ok(StatusCode::NO_CONTENT)
}
