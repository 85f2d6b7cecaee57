// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food diary models.
//!
//! One `DiaryDay` document per user per calendar date, stored at
//! `users/{user_id}/diary/{YYYY-MM-DD}`. The summary is always a full
//! re-sum of the meal list, so recomputing is idempotent.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Slot of the day a meal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MealType {
    Breakfast,
    MorningSnack,
    PreWorkout,
    Lunch,
    PostWorkout,
    AfternoonSnack,
    Dinner,
    Supper,
    Supplement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MealCategory {
    Main,
    Snack,
    Workout,
    Supplement,
}

impl MealType {
    pub const ALL: [MealType; 9] = [
        MealType::Breakfast,
        MealType::MorningSnack,
        MealType::PreWorkout,
        MealType::Lunch,
        MealType::PostWorkout,
        MealType::AfternoonSnack,
        MealType::Dinner,
        MealType::Supper,
        MealType::Supplement,
    ];

    pub fn category(self) -> MealCategory {
        match self {
            MealType::Breakfast | MealType::Lunch | MealType::Dinner => MealCategory::Main,
            MealType::MorningSnack | MealType::AfternoonSnack | MealType::Supper => {
                MealCategory::Snack
            }
            MealType::PreWorkout | MealType::PostWorkout => MealCategory::Workout,
            MealType::Supplement => MealCategory::Supplement,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::MorningSnack => "Morning snack",
            MealType::PreWorkout => "Pre-workout",
            MealType::Lunch => "Lunch",
            MealType::PostWorkout => "Post-workout",
            MealType::AfternoonSnack => "Afternoon snack",
            MealType::Dinner => "Dinner",
            MealType::Supper => "Supper",
            MealType::Supplement => "Supplement",
        }
    }
}

/// How the meal was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CaptureMethod {
    Text,
    Photo,
}

/// A single food item with its estimated nutrition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Food {
    pub name: String,
    /// Free-form portion, e.g. "100g" or "1 unit"
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub calories: f64,
    /// Grams
    #[serde(default)]
    pub protein: f64,
    /// Grams
    #[serde(default)]
    pub carbs: f64,
    /// Grams
    #[serde(default)]
    pub fat: f64,
}

/// Nutrition estimate returned by the AI estimator.
///
/// Field aliases accept the camelCase keys the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NutritionEstimate {
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default, alias = "totalCalories")]
    pub total_calories: Option<f64>,
    #[serde(default, alias = "totalProtein")]
    pub total_protein: Option<f64>,
    #[serde(default, alias = "totalCarbs")]
    pub total_carbs: Option<f64>,
    #[serde(default, alias = "totalFat")]
    pub total_fat: Option<f64>,
    /// Short description (photo estimates only)
    #[serde(default)]
    pub description: Option<String>,
}

impl NutritionEstimate {
    /// Fill any missing total from the food list.
    pub fn fill_missing_totals(&mut self) {
        let sum = |f: fn(&Food) -> f64| self.foods.iter().map(f).sum::<f64>();
        let (cal, pro, carb, fat) = (
            sum(|f| f.calories),
            sum(|f| f.protein),
            sum(|f| f.carbs),
            sum(|f| f.fat),
        );
        self.total_calories.get_or_insert(cal);
        self.total_protein.get_or_insert(pro);
        self.total_carbs.get_or_insert(carb);
        self.total_fat.get_or_insert(fat);
    }
}

/// Nutrition totals of one meal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MealTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl From<&NutritionEstimate> for MealTotals {
    fn from(estimate: &NutritionEstimate) -> Self {
        Self {
            calories: estimate.total_calories.unwrap_or_default(),
            protein: estimate.total_protein.unwrap_or_default(),
            carbs: estimate.total_carbs.unwrap_or_default(),
            fat: estimate.total_fat.unwrap_or_default(),
        }
    }
}

/// A logged meal. Immutable once stored, except for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Meal {
    /// `meal_<unix millis>`, unique within the day
    pub id: String,
    pub meal_type: MealType,
    /// Local wall-clock time `HH:MM`
    pub time: String,
    pub description: String,
    pub method: CaptureMethod,
    #[serde(default)]
    pub foods: Vec<Food>,
    pub totals: MealTotals,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// When the nutrition was estimated or entered (RFC3339)
    pub analyzed_at: String,
}

/// Derived daily totals. Each total is rounded to the nearest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DaySummary {
    pub total_calories: i64,
    pub total_protein: i64,
    pub total_carbs: i64,
    pub total_fat: i64,
    pub meal_count: u32,
}

impl DaySummary {
    /// Full linear re-sum over a meal list.
    pub fn from_meals(meals: &[Meal]) -> Self {
        let mut sum = MealTotals::default();
        for meal in meals {
            sum.calories += meal.totals.calories;
            sum.protein += meal.totals.protein;
            sum.carbs += meal.totals.carbs;
            sum.fat += meal.totals.fat;
        }

        Self {
            total_calories: sum.calories.round() as i64,
            total_protein: sum.protein.round() as i64,
            total_carbs: sum.carbs.round() as i64,
            total_fat: sum.fat.round() as i64,
            meal_count: meals.len() as u32,
        }
    }
}

/// A user's diary for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DiaryDay {
    /// `YYYY-MM-DD` (also the document ID)
    pub date: String,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub summary: DaySummary,
    #[serde(default)]
    pub updated_at: String,
}

impl DiaryDay {
    /// An empty diary, as returned for days with nothing logged.
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            meals: Vec::new(),
            summary: DaySummary::default(),
            updated_at: String::new(),
        }
    }

    pub fn recompute_summary(&mut self) {
        self.summary = DaySummary::from_meals(&self.meals);
    }

    /// Append a meal, suffixing its ID if it collides with an existing one.
    ///
    /// Returns the ID the meal was stored under.
    pub fn push_meal(&mut self, mut meal: Meal, now: &str) -> String {
        if self.meals.iter().any(|m| m.id == meal.id) {
            let base = meal.id.clone();
            let mut n = 1;
            while self.meals.iter().any(|m| m.id == meal.id) {
                meal.id = format!("{base}_{n}");
                n += 1;
            }
        }

        let id = meal.id.clone();
        self.meals.push(meal);
        self.recompute_summary();
        self.updated_at = now.to_string();
        id
    }

    /// Remove a meal by ID. Returns `None` if no such meal exists.
    pub fn remove_meal(&mut self, meal_id: &str, now: &str) -> Option<Meal> {
        let index = self.meals.iter().position(|m| m.id == meal_id)?;
        let removed = self.meals.remove(index);
        self.recompute_summary();
        self.updated_at = now.to_string();
        Some(removed)
    }
}
