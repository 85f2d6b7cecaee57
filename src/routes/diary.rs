// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food diary and nutrition estimation routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CaptureMethod, DiaryDay, Food, Meal, MealTotals, MealType, NutritionEstimate};
use crate::routes::api::{parse_date_param, require_premium, today};
use crate::services::nutrition;
use crate::time_utils::{format_date, format_utc_rfc3339, local_time_hhmm, millis_id};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest stored photo URL.
const MAX_PHOTO_URL_CHARS: usize = 2048;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/diary/today", get(get_today))
        .route("/api/diary/{date}", get(get_day))
        .route("/api/diary/{date}/meals", post(add_meal))
        .route("/api/diary/{date}/meals/{meal_id}", delete(delete_meal))
        .route("/api/nutrition/estimate", post(estimate_text))
        .route("/api/nutrition/estimate-photo", post(estimate_photo))
}

async fn load_day(state: &AppState, user_id: &str, date: &str) -> Result<DiaryDay> {
    Ok(state
        .db
        .get_diary_day(user_id, date)
        .await?
        .unwrap_or_else(|| DiaryDay::empty(date)))
}

/// Today's diary in the configured local offset.
async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DiaryDay>> {
    let date = format_date(today(&state));
    Ok(Json(load_day(&state, &auth.user_id, &date).await?))
}

/// A day's diary; days with nothing logged come back empty.
async fn get_day(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<DiaryDay>> {
    let date = format_date(parse_date_param(&date)?);
    Ok(Json(load_day(&state, &auth.user_id, &date).await?))
}

#[derive(Deserialize)]
struct ImagePayload {
    mime_type: String,
    /// Base64, optionally as a `data:` URL
    data: String,
}

#[derive(Deserialize)]
struct AddMealRequest {
    meal_type: MealType,
    #[serde(default)]
    description: String,
    /// `HH:MM`; defaults to the current local time
    #[serde(default)]
    time: Option<String>,
    /// Manually entered totals skip the estimator
    #[serde(default)]
    totals: Option<MealTotals>,
    #[serde(default)]
    foods: Vec<Food>,
    #[serde(default)]
    image: Option<ImagePayload>,
    #[serde(default)]
    plate_weight_g: Option<f64>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Serialize)]
pub struct AddMealResponse {
    pub meal_id: String,
    pub day: DiaryDay,
}

fn validate_time(raw: &str) -> Result<String> {
    chrono::NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppError::BadRequest(format!("Invalid time '{raw}': expected HH:MM")))
}

fn validate_totals(totals: &MealTotals) -> Result<()> {
    let values = [totals.calories, totals.protein, totals.carbs, totals.fat];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(AppError::BadRequest(
            "totals must be non-negative numbers".to_string(),
        ));
    }
    Ok(())
}

/// Log a meal on a date.
///
/// With `totals` the meal is stored as entered. Otherwise its nutrition is
/// estimated from the photo (if given) or the description, which requires
/// premium access.
async fn add_meal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
    Json(body): Json<AddMealRequest>,
) -> Result<(StatusCode, Json<AddMealResponse>)> {
    let date = format_date(parse_date_param(&date)?);
    let now = Utc::now();
    let time = match body.time.as_deref() {
        Some(raw) => validate_time(raw)?,
        None => local_time_hhmm(now, state.config.diary_utc_offset),
    };
    if body
        .photo_url
        .as_deref()
        .is_some_and(|url| url.chars().count() > MAX_PHOTO_URL_CHARS)
    {
        return Err(AppError::BadRequest("photo_url is too long".to_string()));
    }

    let method = if body.image.is_some() || body.photo_url.is_some() {
        CaptureMethod::Photo
    } else {
        CaptureMethod::Text
    };

    let (description, foods, totals) = match (body.totals, body.image) {
        (Some(totals), _) => {
            validate_totals(&totals)?;
            let description = nutrition::validate_description(&body.description)?.to_string();
            (description, body.foods, totals)
        }
        (None, Some(image)) => {
            let image = nutrition::validate_photo(&image.mime_type, &image.data)?;
            require_premium(&state, &auth.user_id).await?;
            let estimate =
                nutrition::estimate_from_photo(&state.gemini, &image, body.plate_weight_g).await?;
            let description = match body.description.trim() {
                "" => estimate.description.clone().unwrap_or_default(),
                given => given.to_string(),
            };
            let totals = MealTotals::from(&estimate);
            (description, estimate.foods, totals)
        }
        (None, None) => {
            let description = nutrition::validate_description(&body.description)?.to_string();
            require_premium(&state, &auth.user_id).await?;
            let estimate = nutrition::estimate_from_text(&state.gemini, &description).await?;
            let totals = MealTotals::from(&estimate);
            (description, estimate.foods, totals)
        }
    };

    let now_str = format_utc_rfc3339(now);
    let meal = Meal {
        id: millis_id("meal", now),
        meal_type: body.meal_type,
        time,
        description,
        method,
        foods,
        totals,
        photo_url: body.photo_url,
        analyzed_at: now_str.clone(),
    };

    let (day, meal_id) = state
        .db
        .add_meal(&auth.user_id, &date, meal, &now_str)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        date = %date,
        meal_id = %meal_id,
        meal_type = body.meal_type.label(),
        calories = totals.calories,
        "Meal logged"
    );

    Ok((StatusCode::CREATED, Json(AddMealResponse { meal_id, day })))
}

async fn delete_meal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((date, meal_id)): Path<(String, String)>,
) -> Result<Json<DiaryDay>> {
    let date = format_date(parse_date_param(&date)?);
    let day = state
        .db
        .delete_meal(
            &auth.user_id,
            &date,
            &meal_id,
            &format_utc_rfc3339(Utc::now()),
        )
        .await?;

    tracing::info!(user_id = %auth.user_id, date = %date, meal_id = %meal_id, "Meal deleted");
    Ok(Json(day))
}

#[derive(Deserialize)]
struct EstimateTextRequest {
    description: String,
}

/// Estimate nutrition without logging anything.
async fn estimate_text(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<EstimateTextRequest>,
) -> Result<Json<NutritionEstimate>> {
    nutrition::validate_description(&body.description)?;
    require_premium(&state, &auth.user_id).await?;
    Ok(Json(
        nutrition::estimate_from_text(&state.gemini, &body.description).await?,
    ))
}

#[derive(Deserialize)]
struct EstimatePhotoRequest {
    image: ImagePayload,
    #[serde(default)]
    plate_weight_g: Option<f64>,
}

async fn estimate_photo(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<EstimatePhotoRequest>,
) -> Result<Json<NutritionEstimate>> {
    let image = nutrition::validate_photo(&body.image.mime_type, &body.image.data)?;
    require_premium(&state, &auth.user_id).await?;
    Ok(Json(
        nutrition::estimate_from_photo(&state.gemini, &image, body.plate_weight_g).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_time_normalizes() {
        assert_eq!(validate_time("7:05").unwrap(), "07:05");
        assert_eq!(validate_time("23:59").unwrap(), "23:59");
        assert!(validate_time("24:00").is_err());
        assert!(validate_time("noon").is_err());
    }

    #[test]
    fn validate_totals_rejects_negative_and_nan() {
        let mut totals = MealTotals {
            calories: 500.0,
            protein: 30.0,
            carbs: 60.0,
            fat: 15.0,
        };
        assert!(validate_totals(&totals).is_ok());
        totals.fat = -1.0;
        assert!(validate_totals(&totals).is_err());
        totals.fat = f64::NAN;
        assert!(validate_totals(&totals).is_err());
    }
}
