// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard reports derived from diary days and the calorie target.

use serde::Serialize;

use crate::models::{DaySummary, DiaryDay};

/// Days covered by the weekly summary.
pub const WEEK_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Surplus,
    Deficit,
    Balanced,
}

/// Consumed calories against the daily target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeficitReport {
    pub date: String,
    pub target_calories: i64,
    pub consumed_calories: i64,
    /// consumed − target; positive is a surplus
    pub difference: i64,
    pub status: BalanceStatus,
    /// round(consumed / target × 100), 0 without a target
    pub percentage: i64,
}

pub fn deficit_surplus(date: &str, target_calories: i64, consumed_calories: i64) -> DeficitReport {
    let difference = consumed_calories - target_calories;
    let status = match difference {
        d if d > 0 => BalanceStatus::Surplus,
        d if d < 0 => BalanceStatus::Deficit,
        _ => BalanceStatus::Balanced,
    };
    let percentage = if target_calories > 0 {
        (consumed_calories as f64 / target_calories as f64 * 100.0).round() as i64
    } else {
        0
    };

    DeficitReport {
        date: date.to_string(),
        target_calories,
        consumed_calories,
        difference,
        status,
        percentage,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub date: String,
    #[serde(flatten)]
    pub summary: DaySummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct WeekAverages {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummary {
    /// Oldest first
    pub days: Vec<WeekDay>,
    /// Number of days with at least one meal
    pub logged_days: u32,
    /// Averages over logged days only
    pub averages: WeekAverages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_calories: Option<i64>,
}

/// Summarize diary days (already in date order).
pub fn week_summary(days: &[DiaryDay], target_calories: Option<i64>) -> WeekSummary {
    let logged: Vec<&DaySummary> = days
        .iter()
        .map(|d| &d.summary)
        .filter(|s| s.meal_count > 0)
        .collect();

    let averages = if logged.is_empty() {
        WeekAverages::default()
    } else {
        let n = logged.len() as f64;
        let avg = |f: fn(&DaySummary) -> i64| {
            (logged.iter().map(|s| f(s)).sum::<i64>() as f64 / n).round() as i64
        };
        WeekAverages {
            calories: avg(|s| s.total_calories),
            protein: avg(|s| s.total_protein),
            carbs: avg(|s| s.total_carbs),
            fat: avg(|s| s.total_fat),
        }
    };

    WeekSummary {
        days: days
            .iter()
            .map(|d| WeekDay {
                date: d.date.clone(),
                summary: d.summary,
            })
            .collect(),
        logged_days: logged.len() as u32,
        averages,
        target_calories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, calories: i64, meals: u32) -> DiaryDay {
        DiaryDay {
            summary: DaySummary {
                total_calories: calories,
                total_protein: calories / 20,
                total_carbs: calories / 8,
                total_fat: calories / 30,
                meal_count: meals,
            },
            ..DiaryDay::empty(date)
        }
    }

    #[test]
    fn deficit_surplus_by_sign() {
        let r = deficit_surplus("2025-01-01", 2000, 1500);
        assert_eq!(r.difference, -500);
        assert_eq!(r.status, BalanceStatus::Deficit);
        assert_eq!(r.percentage, 75);

        let r = deficit_surplus("2025-01-01", 2000, 2300);
        assert_eq!(r.difference, 300);
        assert_eq!(r.status, BalanceStatus::Surplus);
        assert_eq!(r.percentage, 115);

        assert_eq!(
            deficit_surplus("2025-01-01", 2000, 2000).status,
            BalanceStatus::Balanced
        );
    }

    #[test]
    fn deficit_surplus_without_target() {
        let r = deficit_surplus("2025-01-01", 0, 800);
        assert_eq!(r.percentage, 0);
        assert_eq!(r.status, BalanceStatus::Surplus);
    }

    #[test]
    fn week_averages_skip_empty_days() {
        let days = vec![
            day("2025-01-01", 2000, 3),
            DiaryDay::empty("2025-01-02"),
            day("2025-01-03", 1500, 2),
        ];
        let week = week_summary(&days, Some(1800));
        assert_eq!(week.days.len(), 3);
        assert_eq!(week.logged_days, 2);
        assert_eq!(week.averages.calories, 1750);
        assert_eq!(week.days[1].summary.meal_count, 0);

        let json = serde_json::to_value(&week).unwrap();
        assert_eq!(json["days"][0]["total_calories"], 2000);
        assert_eq!(json["target_calories"], 1800);
    }

    #[test]
    fn empty_week_has_zero_averages() {
        let week = week_summary(&[DiaryDay::empty("2025-01-01")], None);
        assert_eq!(week.averages, WeekAverages::default());
        assert_eq!(week.logged_days, 0);
    }
}
