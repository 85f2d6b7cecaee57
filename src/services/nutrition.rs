// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI nutrition estimation from a meal description or photo.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{AiError, AiErrorKind, AppError, Result};
use crate::models::NutritionEstimate;
use crate::services::gemini::{parse_json_answer, GeminiClient, InlineImage};

/// Image types the vision models accept.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/heic"];

/// Largest accepted photo after decoding (bytes).
pub const MAX_IMAGE_BYTES: usize = 7 * 1024 * 1024;

const MAX_DESCRIPTION_CHARS: usize = 2000;

const ESTIMATE_FORMAT: &str = r#"{
  "foods": [
    {
      "name": "food name",
      "quantity": "estimated quantity (e.g. 100g, 1 unit)",
      "calories": number,
      "protein": number in grams,
      "carbs": number in grams,
      "fat": number in grams
    }
  ],
  "totalCalories": total,
  "totalProtein": total in grams,
  "totalCarbs": total in grams,
  "totalFat": total in grams"#;

fn text_prompt(description: &str) -> String {
    format!(
        "Analyze this meal and return ONLY valid JSON with its nutrition information.\n\n\
         Meal: \"{description}\"\n\n\
         Return in the format:\n{ESTIMATE_FORMAT}\n}}\n\n\
         IMPORTANT: Return ONLY the JSON, with no explanations or markdown."
    )
}

fn photo_prompt(plate_weight_g: Option<f64>) -> String {
    let weight_hint = plate_weight_g
        .map(|w| {
            format!(
                "\n\nIMPORTANT: The plate weighs {w:.0}g in total. Use this weight as the \
                 reference to size each food portion proportionally."
            )
        })
        .unwrap_or_default();

    format!(
        "Analyze this meal photo and identify every visible food.\n\
         For each food, estimate the quantity and the nutrition values.{weight_hint}\n\n\
         Return ONLY valid JSON in the format:\n{ESTIMATE_FORMAT},\n  \
         \"description\": \"short description of the meal\"\n}}\n\n\
         IMPORTANT: Return ONLY the JSON, with no explanations or markdown."
    )
}

/// Validate a meal description before sending it to the model.
pub fn validate_description(description: &str) -> Result<&str> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("description must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::BadRequest(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

/// Validate an uploaded photo; returns the image ready to send.
pub fn validate_photo(mime_type: &str, base64_data: &str) -> Result<InlineImage> {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    if !SUPPORTED_IMAGE_TYPES.contains(&mime_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unsupported image type: {mime_type}"
        )));
    }

    // Accept data URLs as produced by browsers.
    let data = base64_data
        .split_once(";base64,")
        .map(|(_, d)| d)
        .unwrap_or(base64_data)
        .trim();

    let decoded = STANDARD
        .decode(data)
        .map_err(|_| AppError::BadRequest("image is not valid base64".to_string()))?;
    if decoded.is_empty() {
        return Err(AppError::BadRequest("image is empty".to_string()));
    }
    if decoded.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest(format!(
            "image exceeds {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }

    Ok(InlineImage {
        mime_type,
        data: data.to_string(),
    })
}

/// Turn a model answer into an estimate, filling any missing totals.
pub fn parse_estimate(text: &str) -> std::result::Result<NutritionEstimate, AiError> {
    let mut estimate: NutritionEstimate = parse_json_answer(text)?;
    if estimate.foods.is_empty() && estimate.total_calories.is_none() {
        return Err(AiError::new(
            AiErrorKind::InvalidResponse,
            "model answer has neither foods nor totals",
        ));
    }
    estimate.fill_missing_totals();
    Ok(estimate)
}

/// Estimate nutrition from a free-text meal description.
pub async fn estimate_from_text(
    gemini: &GeminiClient,
    description: &str,
) -> Result<NutritionEstimate> {
    let description = validate_description(description)?;
    let answer = gemini.generate(&text_prompt(description), None).await?;
    let estimate = parse_estimate(&answer.text)?;

    tracing::debug!(
        model = %answer.model,
        foods = estimate.foods.len(),
        calories = ?estimate.total_calories,
        "Text nutrition estimate"
    );
    Ok(estimate)
}

/// Estimate nutrition from a meal photo, optionally with the plate weight.
pub async fn estimate_from_photo(
    gemini: &GeminiClient,
    image: &InlineImage,
    plate_weight_g: Option<f64>,
) -> Result<NutritionEstimate> {
    if let Some(w) = plate_weight_g {
        if !w.is_finite() || w <= 0.0 || w > 5000.0 {
            return Err(AppError::BadRequest(
                "plate_weight_g must be between 0 and 5000".to_string(),
            ));
        }
    }

    let answer = gemini
        .generate(&photo_prompt(plate_weight_g), Some(image))
        .await?;
    let estimate = parse_estimate(&answer.text)?;

    tracing::debug!(
        model = %answer.model,
        foods = estimate.foods.len(),
        calories = ?estimate.total_calories,
        "Photo nutrition estimate"
    );
    Ok(estimate)
}
