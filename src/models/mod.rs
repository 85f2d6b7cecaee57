// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod diary;
pub mod preferences;
pub mod profile;
pub mod recipe;
pub mod subscription;
pub mod supplement;
pub mod user;
pub mod weight;

pub use diary::{
    CaptureMethod, DaySummary, DiaryDay, Food, Meal, MealCategory, MealTotals, MealType,
    NutritionEstimate,
};
pub use preferences::FoodPreferences;
pub use profile::{
    ActivityLevel, BmiClass, BmrFormula, CalculatedMetrics, Goal, Macros, Profile, Sex,
};
pub use recipe::{Difficulty, FavoriteRecipe, Recipe, RecipeNutrition, RecipeRequest};
pub use subscription::{SubscriptionRecord, SubscriptionStatus};
pub use supplement::Supplement;
pub use user::{AuthProvider, Credentials, User};
pub use weight::WeightEntry;
