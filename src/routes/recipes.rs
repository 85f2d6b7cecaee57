// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe generation and saved favorites.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FavoriteRecipe, Recipe, RecipeRequest};
use crate::routes::api::{load_user, require_premium};
use crate::services::recipes;
use crate::time_utils::{format_utc_rfc3339, millis_id};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipes/generate", post(generate))
        .route("/api/recipes/favorites", get(list_favorites).post(save_favorite))
        .route("/api/recipes/favorites/{id}", delete(delete_favorite))
}

/// Generate a recipe tailored to the user's profile.
async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RecipeRequest>,
) -> Result<Json<Recipe>> {
    recipes::validate_request(&body)?;
    require_premium(&state, &auth.user_id).await?;

    let user = load_user(&state, &auth.user_id).await?;
    let recipe = recipes::generate_recipe(&state.gemini, &body, user.profile.as_ref()).await?;

    tracing::info!(user_id = %auth.user_id, recipe = %recipe.name, "Recipe generated");
    Ok(Json(recipe))
}

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<FavoriteRecipe>>> {
    Ok(Json(state.db.list_favorites(&auth.user_id).await?))
}

#[derive(Deserialize)]
struct SaveFavoriteRequest {
    recipe: Recipe,
}

async fn save_favorite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SaveFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteRecipe>)> {
    if !body.recipe.is_complete() {
        return Err(AppError::BadRequest(
            "recipe needs a name, ingredients and instructions".to_string(),
        ));
    }

    let now = Utc::now();
    let favorite = FavoriteRecipe {
        id: millis_id("rec", now),
        recipe: body.recipe,
        saved_at: format_utc_rfc3339(now),
    };
    state.db.set_favorite(&auth.user_id, &favorite).await?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

async fn delete_favorite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.db.delete_favorite(&auth.user_id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("favorite {id} not found")))
    }
}
