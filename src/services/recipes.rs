// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI recipe generation.

use crate::error::{AiError, AiErrorKind, AppError, Result};
use crate::models::{Difficulty, Goal, Profile, Recipe, RecipeRequest};
use crate::services::gemini::{parse_json_answer, GeminiClient};

const MAX_INGREDIENTS: usize = 30;

/// Share of the daily target used as the per-meal calorie hint.
const MEAL_SHARE_DIVISOR: i32 = 4;

fn goal_phrase(goal: Goal) -> &'static str {
    match goal {
        Goal::Perder => "weight loss (favor lean protein and fiber, moderate calories)",
        Goal::Manter => "weight maintenance (balanced macros)",
        Goal::Ganhar => "muscle gain (high protein, enough calories)",
    }
}

fn difficulty_phrase(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "easy",
        Difficulty::Medium => "medium",
        Difficulty::Hard => "hard",
    }
}

/// Per-serving calorie cap: the explicit request value, else a quarter of
/// the profile's daily target.
pub fn calorie_hint(request: &RecipeRequest, profile: Option<&Profile>) -> Option<u32> {
    request.max_calories.or_else(|| {
        let target = profile?.calculated.as_ref()?.target_calories;
        u32::try_from(target / MEAL_SHARE_DIVISOR).ok()
    })
}

/// Validate a request: at least one ingredient, bounded list.
pub fn validate_request(request: &RecipeRequest) -> Result<()> {
    let ingredients = request
        .ingredients
        .iter()
        .filter(|i| !i.trim().is_empty())
        .count();
    if ingredients == 0 {
        return Err(AppError::BadRequest(
            "at least one ingredient is required".to_string(),
        ));
    }
    if request.ingredients.len() > MAX_INGREDIENTS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_INGREDIENTS} ingredients"
        )));
    }
    Ok(())
}

/// Build the generation prompt, merging profile restrictions and goal.
pub fn build_prompt(request: &RecipeRequest, profile: Option<&Profile>) -> String {
    let ingredients = request
        .ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut restrictions: Vec<&str> = request.restrictions.iter().map(String::as_str).collect();
    let mut conditions: Vec<&str> = request
        .health_conditions
        .iter()
        .map(String::as_str)
        .collect();
    if let Some(p) = profile {
        restrictions.extend(p.restrictions.iter().map(String::as_str));
        conditions.extend(p.health_conditions.iter().map(String::as_str));
    }
    restrictions.sort_unstable();
    restrictions.dedup();
    conditions.sort_unstable();
    conditions.dedup();

    let mut lines = vec![format!(
        "Create a healthy recipe using mainly these ingredients: {ingredients}."
    )];
    if let Some(meal_type) = request.meal_type {
        lines.push(format!("Meal: {}.", meal_type.label()));
    }
    if let Some(goal) = request.goal.or(profile.map(|p| p.goal)) {
        lines.push(format!("Nutrition goal: {}.", goal_phrase(goal)));
    }
    if let Some(kcal) = calorie_hint(request, profile) {
        lines.push(format!("Keep it at or below {kcal} kcal per serving."));
    }
    if let Some(difficulty) = request.difficulty {
        lines.push(format!("Difficulty: {}.", difficulty_phrase(difficulty)));
    }
    if let Some(minutes) = request.max_time_minutes {
        lines.push(format!("Total time at most {minutes} minutes."));
    }
    if !restrictions.is_empty() {
        lines.push(format!(
            "Dietary restrictions (must respect): {}.",
            restrictions.join(", ")
        ));
    }
    if !conditions.is_empty() {
        lines.push(format!(
            "Health conditions to take into account: {}.",
            conditions.join(", ")
        ));
    }

    format!(
        "{}\n\nReturn ONLY valid JSON in the format:\n{{\n  \
         \"name\": \"recipe name\",\n  \
         \"description\": \"one sentence\",\n  \
         \"prepTimeMinutes\": number,\n  \
         \"servings\": number,\n  \
         \"difficulty\": \"easy\" | \"medium\" | \"hard\",\n  \
         \"ingredients\": [\"quantity and ingredient\"],\n  \
         \"instructions\": [\"step\"],\n  \
         \"nutrition\": {{ \"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number }},\n  \
         \"tips\": [\"tip\"]\n}}\n\n\
         IMPORTANT: Return ONLY the JSON, with no explanations or markdown.",
        lines.join("\n")
    )
}

/// Parse a model answer, rejecting recipes without name, ingredients or steps.
pub fn parse_recipe(text: &str) -> std::result::Result<Recipe, AiError> {
    let recipe: Recipe = parse_json_answer(text)?;
    if !recipe.is_complete() {
        return Err(AiError::new(
            AiErrorKind::InvalidResponse,
            "recipe is missing name, ingredients or instructions",
        ));
    }
    Ok(recipe)
}

pub async fn generate_recipe(
    gemini: &GeminiClient,
    request: &RecipeRequest,
    profile: Option<&Profile>,
) -> Result<Recipe> {
    validate_request(request)?;
    let answer = gemini.generate(&build_prompt(request, profile), None).await?;
    let recipe = parse_recipe(&answer.text)?;

    tracing::debug!(model = %answer.model, recipe = %recipe.name, "Generated recipe");
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, BmrFormula, MealType, Sex};
    use crate::services::metrics;

    fn request(ingredients: &[&str]) -> RecipeRequest {
        RecipeRequest {
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            meal_type: None,
            difficulty: None,
            max_time_minutes: None,
            restrictions: vec![],
            health_conditions: vec![],
            goal: None,
            max_calories: None,
        }
    }

    fn profile() -> Profile {
        let mut p = Profile {
            age: 30,
            sex: Sex::M,
            weight: 75.0,
            height: 175.0,
            activity_level: ActivityLevel::Moderado,
            goal: Goal::Perder,
            target_weight: None,
            target_date: None,
            health_conditions: vec!["diabetes".to_string()],
            restrictions: vec!["lactose_free".to_string()],
            calculated: None,
        };
        p.calculated = Some(metrics::calculate(
            &p,
            BmrFormula::MifflinStJeor,
            "2025-01-01T00:00:00Z",
        ));
        p
    }

    #[test]
    fn calorie_hint_defaults_to_quarter_of_target() {
        let p = profile();
        // 2133 / 4
        assert_eq!(calorie_hint(&request(&["egg"]), Some(&p)), Some(533));

        let mut explicit = request(&["egg"]);
        explicit.max_calories = Some(400);
        assert_eq!(calorie_hint(&explicit, Some(&p)), Some(400));

        assert_eq!(calorie_hint(&request(&["egg"]), None), None);
    }

    #[test]
    fn prompt_merges_profile_restrictions() {
        let mut req = request(&["chicken", " ", "rice"]);
        req.meal_type = Some(MealType::Lunch);
        req.restrictions = vec!["lactose_free".to_string(), "gluten_free".to_string()];

        let prompt = build_prompt(&req, Some(&profile()));
        assert!(prompt.contains("ingredients: chicken, rice."));
        assert!(prompt.contains("Meal: Lunch."));
        assert!(prompt.contains("weight loss"));
        assert!(prompt.contains("533 kcal"));
        assert!(prompt.contains("gluten_free, lactose_free."));
        assert!(prompt.contains("diabetes"));
    }

    #[test]
    fn validate_request_requires_ingredients() {
        assert!(validate_request(&request(&[])).is_err());
        assert!(validate_request(&request(&["  "])).is_err());
        assert!(validate_request(&request(&["tofu"])).is_ok());
    }

    #[test]
    fn parse_recipe_rejects_incomplete() {
        let err = parse_recipe(r#"{"name":"Soup","ingredients":["water"]}"#).unwrap_err();
        assert_eq!(err.kind, AiErrorKind::InvalidResponse);

        let ok = parse_recipe(
            "```json\n{\"name\":\"Soup\",\"ingredients\":[\"water\"],\"instructions\":[\"Boil\"]}\n```",
        )
        .unwrap();
        assert_eq!(ok.name, "Soup");
    }
}
