// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    ActivityLevel, AuthProvider, CalculatedMetrics, Credentials, FoodPreferences, Goal, Profile,
    Sex, Supplement, User, WeightEntry,
};
use crate::services::{metrics, password, reports, subscription, AccessState};
use crate::time_utils::{
    format_date, format_utc_rfc3339, local_date, millis_id, parse_date, parse_rfc3339,
    trailing_dates,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_WEIGHT_HISTORY: u32 = 30;
const MAX_WEIGHT_HISTORY: u32 = 365;
const MAX_NAME_CHARS: usize = 100;
const MAX_LIST_ITEMS: usize = 30;

/// Account, profile, weight, supplement and report routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/password", put(change_password))
        .route("/api/profile", get(get_profile).put(save_profile))
        .route("/api/profile/recalculate", post(recalculate_profile))
        .route("/api/metrics", get(get_metrics))
        .route("/api/weight", get(get_weight_history).post(save_weight))
        .route("/api/subscription", get(get_subscription))
        .route(
            "/api/preferences",
            get(get_preferences).put(save_preferences),
        )
        .route(
            "/api/supplements",
            get(list_supplements).post(create_supplement),
        )
        .route(
            "/api/supplements/{id}",
            put(update_supplement).delete(delete_supplement),
        )
        .route("/api/reports/deficit", get(get_deficit_report))
        .route("/api/reports/week", get(get_week_report))
}

// ─── Shared helpers ──────────────────────────────────────────

/// Load the authenticated user's document.
pub(crate) async fn load_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

/// Evaluate the user's subscription at the current time.
pub(crate) async fn access_for(state: &AppState, user_id: &str) -> Result<AccessState> {
    let record = state.db.get_subscription(user_id).await?;
    Ok(subscription::evaluate(
        record.as_ref(),
        Utc::now(),
        state.config.premium_override,
    ))
}

/// Fail with 402 unless the user is premium.
pub(crate) async fn require_premium(state: &AppState, user_id: &str) -> Result<()> {
    let access = access_for(state, user_id).await?;
    if !access.is_premium {
        tracing::info!(user_id, status = ?access.status, "Premium feature refused");
    }
    subscription::require_premium(&access)
}

/// Parse a `YYYY-MM-DD` path or query parameter.
pub(crate) fn parse_date_param(raw: &str) -> Result<chrono::NaiveDate> {
    parse_date(raw).ok_or_else(|| {
        AppError::BadRequest(format!("Invalid date '{raw}': expected YYYY-MM-DD"))
    })
}

/// Today's date in the diary's local offset.
pub(crate) fn today(state: &AppState) -> chrono::NaiveDate {
    local_date(Utc::now(), state.config.diary_utc_offset)
}

fn clean_list(items: Vec<String>, field: &str) -> Result<Vec<String>> {
    if items.len() > MAX_LIST_ITEMS {
        return Err(AppError::BadRequest(format!(
            "{field} must have at most {MAX_LIST_ITEMS} items"
        )));
    }
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

// ─── User ────────────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub auth_provider: AuthProvider,
    pub has_profile: bool,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            auth_provider: user.auth_provider,
            has_profile: user.profile.is_some(),
            created_at: user.created_at.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub subscription: AccessState,
}

/// Get current user and their access state.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let mut user = load_user(&state, &auth.user_id).await?;
    let subscription = access_for(&state, &auth.user_id).await?;

    // Refresh last_active at most once per day to limit writes.
    let now = Utc::now();
    let stale = parse_rfc3339(&user.last_active)
        .is_none_or(|last| now - last > chrono::Duration::days(1));
    if stale {
        user.last_active = format_utc_rfc3339(now);
        if let Err(e) = state.db.upsert_user(&user).await {
            tracing::warn!(user_id = %auth.user_id, error = %e, "Failed to refresh last_active");
        }
    }

    Ok(Json(MeResponse {
        user: UserResponse::from(&user),
        subscription,
    }))
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    #[serde(default)]
    current_password: Option<String>,
    new_password: String,
}

/// Change (or, for Google-only accounts, set) the account password.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    password::validate_password(&body.new_password).map_err(AppError::BadRequest)?;

    let user = load_user(&state, &auth.user_id).await?;
    let mut credentials = state
        .db
        .get_credentials(&user.email)
        .await?
        .unwrap_or_else(|| Credentials {
            user_id: user.id.clone(),
            email: user.email.clone(),
            password_hash: None,
            updated_at: String::new(),
        });

    if let Some(existing) = credentials.password_hash.clone() {
        let current = body.current_password.unwrap_or_default();
        let ok = crate::routes::auth::verify_password_blocking(current, existing).await?;
        if !ok {
            return Err(AppError::Forbidden(
                "current password is incorrect".to_string(),
            ));
        }
    }

    credentials.password_hash =
        Some(crate::routes::auth::hash_password_blocking(body.new_password).await?);
    credentials.updated_at = format_utc_rfc3339(Utc::now());
    state.db.set_credentials(&credentials).await?;

    tracing::info!(user_id = %auth.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Profile & Metrics ───────────────────────────────────────

#[derive(Deserialize)]
struct ProfileRequest {
    age: u32,
    sex: Sex,
    weight: f64,
    /// Centimeters, or meters when between 0.5 and 2.5
    height: f64,
    activity_level: ActivityLevel,
    goal: Goal,
    #[serde(default)]
    target_weight: Option<f64>,
    #[serde(default)]
    target_date: Option<String>,
    #[serde(default)]
    health_conditions: Vec<String>,
    #[serde(default)]
    restrictions: Vec<String>,
}

impl ProfileRequest {
    fn into_profile(self) -> Result<Profile> {
        let height = metrics::normalize_height(self.height).ok_or_else(|| {
            AppError::BadRequest(format!(
                "height must be between {} and {} cm",
                metrics::MIN_HEIGHT_CM,
                metrics::MAX_HEIGHT_CM
            ))
        })?;
        metrics::validate_biometrics(self.age, self.weight, height)
            .map_err(AppError::BadRequest)?;

        if let Some(target) = self.target_weight {
            if !target.is_finite()
                || !(metrics::MIN_WEIGHT_KG..=metrics::MAX_WEIGHT_KG).contains(&target)
            {
                return Err(AppError::BadRequest(
                    "target_weight is out of range".to_string(),
                ));
            }
        }
        if let Some(date) = self.target_date.as_deref() {
            parse_date_param(date)?;
        }

        Ok(Profile {
            age: self.age,
            sex: self.sex,
            weight: self.weight,
            height,
            activity_level: self.activity_level,
            goal: self.goal,
            target_weight: self.target_weight,
            target_date: self.target_date,
            health_conditions: clean_list(self.health_conditions, "health_conditions")?,
            restrictions: clean_list(self.restrictions, "restrictions")?,
            calculated: None,
        })
    }
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    let user = load_user(&state, &auth.user_id).await?;
    user.profile
        .map(Json)
        .ok_or_else(|| AppError::NotFound("profile not set".to_string()))
}

/// Create or replace the profile, computing fresh metrics.
async fn save_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<Profile>> {
    let mut profile = body.into_profile()?;
    metrics::recalculate(&mut profile, &format_utc_rfc3339(Utc::now()));

    let mut user = load_user(&state, &auth.user_id).await?;
    user.profile = Some(profile.clone());
    state.db.upsert_user(&user).await?;

    tracing::info!(
        user_id = %auth.user_id,
        target_calories = profile.calculated.as_ref().map(|m| m.target_calories),
        "Profile saved"
    );
    Ok(Json(profile))
}

/// Recompute stored metrics with the current formula.
async fn recalculate_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    let mut user = load_user(&state, &auth.user_id).await?;
    let profile = user
        .profile
        .as_mut()
        .ok_or_else(|| AppError::NotFound("profile not set".to_string()))?;

    let previous = profile.calculated.as_ref().map(|m| m.formula);
    metrics::recalculate(profile, &format_utc_rfc3339(Utc::now()));
    let profile = profile.clone();
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %auth.user_id, previous_formula = ?previous, "Metrics recalculated");
    Ok(Json(profile))
}

#[derive(Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub metrics: CalculatedMetrics,
    /// Computed with an older formula; `POST /api/profile/recalculate` updates it
    pub stale: bool,
}

async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MetricsResponse>> {
    let user = load_user(&state, &auth.user_id).await?;
    let profile = user
        .profile
        .ok_or_else(|| AppError::NotFound("profile not set".to_string()))?;
    let stale = metrics::is_stale(&profile);
    let calculated = profile
        .calculated
        .ok_or_else(|| AppError::NotFound("metrics not calculated".to_string()))?;

    Ok(Json(MetricsResponse {
        metrics: calculated,
        stale,
    }))
}

// ─── Weight ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct WeightHistoryQuery {
    #[serde(default)]
    limit: Option<u32>,
}

async fn get_weight_history(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<WeightHistoryQuery>,
) -> Result<Json<Vec<WeightEntry>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_WEIGHT_HISTORY)
        .clamp(1, MAX_WEIGHT_HISTORY);
    Ok(Json(state.db.weight_history(&auth.user_id, limit).await?))
}

#[derive(Deserialize)]
struct SaveWeightRequest {
    weight: f64,
    /// Defaults to today (diary-local)
    #[serde(default)]
    date: Option<String>,
}

#[derive(Serialize)]
pub struct SaveWeightResponse {
    pub entry: WeightEntry,
    pub profile: Option<Profile>,
}

/// Record today's (or a given day's) weight; updates profile metrics.
async fn save_weight(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SaveWeightRequest>,
) -> Result<(StatusCode, Json<SaveWeightResponse>)> {
    if !body.weight.is_finite()
        || !(metrics::MIN_WEIGHT_KG..=metrics::MAX_WEIGHT_KG).contains(&body.weight)
    {
        return Err(AppError::BadRequest(format!(
            "weight must be between {} and {} kg",
            metrics::MIN_WEIGHT_KG,
            metrics::MAX_WEIGHT_KG
        )));
    }

    let date = match body.date.as_deref() {
        Some(raw) => parse_date_param(raw)?,
        None => today(&state),
    };
    if date > today(&state) {
        return Err(AppError::BadRequest(
            "cannot record weight for a future date".to_string(),
        ));
    }

    let entry = WeightEntry {
        date: format_date(date),
        weight: (body.weight * 10.0).round() / 10.0,
        recorded_at: format_utc_rfc3339(Utc::now()),
    };
    let profile = state.db.save_weight(&auth.user_id, &entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveWeightResponse { entry, profile }),
    ))
}

// ─── Subscription ────────────────────────────────────────────

#[derive(Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub access: AccessState,
    pub plan: Option<String>,
    pub trial_end: Option<String>,
    pub expires_at: Option<String>,
}

async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<SubscriptionResponse>> {
    let record = state.db.get_subscription(&auth.user_id).await?;
    let access = subscription::evaluate(
        record.as_ref(),
        Utc::now(),
        state.config.premium_override,
    );

    Ok(Json(SubscriptionResponse {
        access,
        plan: record.as_ref().and_then(|r| r.plan.clone()),
        trial_end: record.as_ref().and_then(|r| r.trial_end.clone()),
        expires_at: record.and_then(|r| r.expires_at),
    }))
}

// ─── Preferences ─────────────────────────────────────────────

/// Stored food preferences, or `null` when never saved.
async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Option<FoodPreferences>>> {
    Ok(Json(state.db.get_preferences(&auth.user_id).await?))
}

async fn save_preferences(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(mut body): Json<FoodPreferences>,
) -> Result<Json<FoodPreferences>> {
    if body.meals_per_day.is_some_and(|n| !(1..=10).contains(&n)) {
        return Err(AppError::BadRequest(
            "meals_per_day must be between 1 and 10".to_string(),
        ));
    }
    body.restrictions = clean_list(body.restrictions, "restrictions")?;
    body.dislikes = clean_list(body.dislikes, "dislikes")?;
    body.favorite_foods = clean_list(body.favorite_foods, "favorite_foods")?;
    body.updated_at = format_utc_rfc3339(Utc::now());

    state.db.set_preferences(&auth.user_id, &body).await?;
    Ok(Json(body))
}

// ─── Supplements ─────────────────────────────────────────────

#[derive(Deserialize)]
struct SupplementRequest {
    name: String,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default)]
    timing: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl SupplementRequest {
    fn validated_name(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "name must be 1 to {MAX_NAME_CHARS} characters"
            )));
        }
        Ok(name.to_string())
    }
}

async fn list_supplements(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Supplement>>> {
    Ok(Json(state.db.list_supplements(&auth.user_id).await?))
}

async fn create_supplement(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SupplementRequest>,
) -> Result<(StatusCode, Json<Supplement>)> {
    let name = body.validated_name()?;
    let now = Utc::now();
    let now_str = format_utc_rfc3339(now);

    let supplement = Supplement {
        id: millis_id("sup", now),
        name,
        dosage: body.dosage,
        timing: body.timing,
        notes: body.notes,
        created_at: now_str.clone(),
        updated_at: now_str,
    };
    state.db.set_supplement(&auth.user_id, &supplement).await?;

    Ok((StatusCode::CREATED, Json(supplement)))
}

async fn update_supplement(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<SupplementRequest>,
) -> Result<Json<Supplement>> {
    let name = body.validated_name()?;
    let mut supplement = state
        .db
        .get_supplement(&auth.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("supplement {id} not found")))?;

    supplement.name = name;
    supplement.dosage = body.dosage;
    supplement.timing = body.timing;
    supplement.notes = body.notes;
    supplement.updated_at = format_utc_rfc3339(Utc::now());
    state.db.set_supplement(&auth.user_id, &supplement).await?;

    Ok(Json(supplement))
}

async fn delete_supplement(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.db.get_supplement(&auth.user_id, &id).await?.is_none() {
        return Err(AppError::NotFound(format!("supplement {id} not found")));
    }
    state.db.delete_supplement(&auth.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct DeficitQuery {
    #[serde(default)]
    date: Option<String>,
}

/// Consumed vs target calories for one day (default today).
async fn get_deficit_report(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<DeficitQuery>,
) -> Result<Json<reports::DeficitReport>> {
    let date = match params.date.as_deref() {
        Some(raw) => parse_date_param(raw)?,
        None => today(&state),
    };
    let date = format_date(date);

    let user = load_user(&state, &auth.user_id).await?;
    let target = user
        .profile
        .and_then(|p| p.calculated)
        .map(|m| m.target_calories)
        .ok_or_else(|| AppError::NotFound("profile not set".to_string()))?;

    let consumed = state
        .db
        .get_diary_day(&auth.user_id, &date)
        .await?
        .map(|d| d.summary.total_calories)
        .unwrap_or(0);

    Ok(Json(reports::deficit_surplus(
        &date,
        i64::from(target),
        consumed,
    )))
}

/// Totals for the last seven diary-local days.
async fn get_week_report(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<reports::WeekSummary>> {
    let dates: Vec<String> = trailing_dates(today(&state), reports::WEEK_DAYS)
        .into_iter()
        .map(format_date)
        .collect();

    let user = load_user(&state, &auth.user_id).await?;
    let target = user
        .profile
        .and_then(|p| p.calculated)
        .map(|m| i64::from(m.target_calories));

    let days = state.db.get_diary_days(&auth.user_id, &dates).await?;
    Ok(Json(reports::week_summary(&days, target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_request() -> ProfileRequest {
        ProfileRequest {
            age: 30,
            sex: Sex::F,
            weight: 60.0,
            height: 1.65,
            activity_level: ActivityLevel::Leve,
            goal: Goal::Manter,
            target_weight: None,
            target_date: None,
            health_conditions: vec![" hypertension ".to_string(), "".to_string()],
            restrictions: vec![],
        }
    }

    #[test]
    fn profile_request_normalizes_height_and_lists() {
        let profile = profile_request().into_profile().unwrap();
        assert_eq!(profile.height, 165.0);
        assert_eq!(profile.health_conditions, vec!["hypertension"]);
        assert!(profile.calculated.is_none());
    }

    #[test]
    fn profile_request_rejects_bad_values() {
        let mut req = profile_request();
        req.height = 3.0;
        assert!(matches!(req.into_profile(), Err(AppError::BadRequest(_))));

        let mut req = profile_request();
        req.age = 5;
        assert!(req.into_profile().is_err());

        let mut req = profile_request();
        req.target_date = Some("31/12/2025".to_string());
        assert!(req.into_profile().is_err());
    }

    #[test]
    fn parse_date_param_message() {
        let err = parse_date_param("2025-13-01").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("YYYY-MM-DD")));
    }
}
