//! Food preferences questionnaire.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored at `users/{user_id}/preferences/food`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodPreferences {
    /// e.g. "vegetarian", "lactose_free"
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
    #[serde(default)]
    pub meals_per_day: Option<u8>,
    #[serde(default)]
    pub cooking_skill: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}
