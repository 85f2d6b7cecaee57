// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Biometric profile and the metrics derived from it.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Sex {
    M,
    F,
}

/// Weekly exercise level, mapped to a TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentario,
    /// Light exercise 1-3 days/week
    Leve,
    /// Moderate exercise 3-5 days/week
    Moderado,
    /// Hard exercise 6-7 days/week
    Intenso,
    /// Very hard exercise or physical job
    MuitoIntenso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Goal {
    /// Lose weight
    Perder,
    /// Maintain weight
    Manter,
    /// Gain weight
    Ganhar,
}

/// Basal metabolic rate equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum BmrFormula {
    #[default]
    MifflinStJeor,
    /// Revised Harris-Benedict, used by older stored profiles
    HarrisBenedict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum BmiClass {
    Underweight,
    Normal,
    Overweight,
    #[serde(rename = "obesity_1")]
    ObesityI,
    #[serde(rename = "obesity_2")]
    ObesityII,
    #[serde(rename = "obesity_3")]
    ObesityIII,
}

/// Daily macro targets in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Macros {
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

/// Metrics computed from a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalculatedMetrics {
    pub bmi: f64,
    pub bmi_classification: BmiClass,
    /// kcal/day
    pub bmr: i32,
    /// kcal/day
    pub tdee: i32,
    /// kcal/day
    pub target_calories: i32,
    pub macros: Macros,
    /// Older documents predate this field and used Harris-Benedict.
    #[serde(default = "legacy_formula")]
    pub formula: BmrFormula,
    pub updated_at: String,
}

fn legacy_formula() -> BmrFormula {
    BmrFormula::HarrisBenedict
}

/// User-entered biometric profile, embedded in the user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    pub age: u32,
    pub sex: Sex,
    /// Kilograms
    pub weight: f64,
    /// Centimeters
    pub height: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    #[serde(default)]
    pub target_weight: Option<f64>,
    /// Target date (`YYYY-MM-DD`)
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub calculated: Option<CalculatedMetrics>,
}
