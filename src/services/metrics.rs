// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Energy and body-composition calculator.
//!
//! Pure functions over a [`Profile`]: BMI, BMR, TDEE, goal-adjusted
//! target calories and macro split.

use crate::models::{
    ActivityLevel, BmiClass, BmrFormula, CalculatedMetrics, Goal, Macros, Profile, Sex,
};

/// Daily deficit applied when losing weight (kcal).
pub const LOSE_OFFSET_KCAL: i32 = -500;
/// Daily surplus applied when gaining weight (kcal).
pub const GAIN_OFFSET_KCAL: i32 = 300;

/// Fraction of target calories allotted to fat.
const FAT_CALORIE_SHARE: f64 = 0.25;
const KCAL_PER_G_PROTEIN: i32 = 4;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

pub const MIN_HEIGHT_CM: f64 = 50.0;
pub const MAX_HEIGHT_CM: f64 = 250.0;
pub const MIN_WEIGHT_KG: f64 = 20.0;
pub const MAX_WEIGHT_KG: f64 = 400.0;
pub const MIN_AGE: u32 = 10;
pub const MAX_AGE: u32 = 120;

/// Body mass index, rounded to 2 decimals.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round2(weight_kg / (height_m * height_m))
}

pub fn bmi_classification(bmi: f64) -> BmiClass {
    if bmi < 18.5 {
        BmiClass::Underweight
    } else if bmi < 25.0 {
        BmiClass::Normal
    } else if bmi < 30.0 {
        BmiClass::Overweight
    } else if bmi < 35.0 {
        BmiClass::ObesityI
    } else if bmi < 40.0 {
        BmiClass::ObesityII
    } else {
        BmiClass::ObesityIII
    }
}

/// Basal metabolic rate in kcal/day, rounded to an integer.
pub fn bmr(formula: BmrFormula, weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> i32 {
    let age = age as f64;
    let raw = match (formula, sex) {
        (BmrFormula::MifflinStJeor, Sex::M) => {
            10.0 * weight_kg + 6.25 * height_cm - 5.0 * age + 5.0
        }
        (BmrFormula::MifflinStJeor, Sex::F) => {
            10.0 * weight_kg + 6.25 * height_cm - 5.0 * age - 161.0
        }
        (BmrFormula::HarrisBenedict, Sex::M) => {
            88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age
        }
        (BmrFormula::HarrisBenedict, Sex::F) => {
            447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age
        }
    };
    raw.round() as i32
}

pub fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentario => 1.2,
        ActivityLevel::Leve => 1.375,
        ActivityLevel::Moderado => 1.55,
        ActivityLevel::Intenso => 1.725,
        ActivityLevel::MuitoIntenso => 1.9,
    }
}

/// Total daily energy expenditure: `round(bmr × factor)`.
pub fn tdee(bmr: i32, level: ActivityLevel) -> i32 {
    (bmr as f64 * activity_factor(level)).round() as i32
}

pub fn target_calories(tdee: i32, goal: Goal) -> i32 {
    match goal {
        Goal::Perder => tdee + LOSE_OFFSET_KCAL,
        Goal::Manter => tdee,
        Goal::Ganhar => tdee + GAIN_OFFSET_KCAL,
    }
}

/// Protein by body weight, fat by share of calories, carbs as remainder.
pub fn macros(target_calories: i32, weight_kg: f64, goal: Goal) -> Macros {
    let protein_per_kg = match goal {
        Goal::Perder | Goal::Ganhar => 2.0,
        Goal::Manter => 1.6,
    };
    let protein = (weight_kg * protein_per_kg).round() as i32;
    let fat_calories = (target_calories as f64 * FAT_CALORIE_SHARE).round();
    let fat = (fat_calories / KCAL_PER_G_FAT).round() as i32;
    let carbs_calories =
        target_calories as f64 - (protein * KCAL_PER_G_PROTEIN) as f64 - fat_calories;
    let carbs = (carbs_calories / KCAL_PER_G_CARBS).round().max(0.0) as i32;

    Macros {
        protein,
        carbs,
        fat,
    }
}

/// Compute every derived metric for a profile.
pub fn calculate(profile: &Profile, formula: BmrFormula, now: &str) -> CalculatedMetrics {
    let bmi_value = bmi(profile.weight, profile.height);
    let bmr_value = bmr(
        formula,
        profile.weight,
        profile.height,
        profile.age,
        profile.sex,
    );
    let tdee_value = tdee(bmr_value, profile.activity_level);
    let target = target_calories(tdee_value, profile.goal);

    CalculatedMetrics {
        bmi: bmi_value,
        bmi_classification: bmi_classification(bmi_value),
        bmr: bmr_value,
        tdee: tdee_value,
        target_calories: target,
        macros: macros(target, profile.weight, profile.goal),
        formula,
        updated_at: now.to_string(),
    }
}

/// Recompute and store a profile's metrics with the current formula.
pub fn recalculate(profile: &mut Profile, now: &str) {
    profile.calculated = Some(calculate(profile, BmrFormula::default(), now));
}

/// Whether stored metrics were computed with an older formula (or never).
pub fn is_stale(profile: &Profile) -> bool {
    profile
        .calculated
        .as_ref()
        .is_none_or(|m| m.formula != BmrFormula::default())
}

/// Interpret a height entered either in meters (0.5–2.5) or centimeters.
///
/// Returns centimeters, or `None` when out of the accepted range.
pub fn normalize_height(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let cm = if (0.5..=2.5).contains(&value) {
        value * 100.0
    } else {
        value
    };
    (MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&cm).then_some(cm)
}

/// Check biometric inputs, returning a message for the first invalid one.
pub fn validate_biometrics(age: u32, weight_kg: f64, height_cm: f64) -> Result<(), String> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(format!("age must be between {MIN_AGE} and {MAX_AGE}"));
    }
    if !weight_kg.is_finite() || !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight_kg) {
        return Err(format!(
            "weight must be between {MIN_WEIGHT_KG} and {MAX_WEIGHT_KG} kg"
        ));
    }
    if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&height_cm) {
        return Err(format!(
            "height must be between {MIN_HEIGHT_CM} and {MAX_HEIGHT_CM} cm"
        ));
    }
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
