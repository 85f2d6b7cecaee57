//! Body weight history.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One weigh-in per calendar day, stored at
/// `users/{user_id}/weightHistory/{YYYY-MM-DD}`. Saving again on the same
/// day replaces the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeightEntry {
    /// `YYYY-MM-DD` (also the document ID)
    pub date: String,
    /// Kilograms
    pub weight: f64,
    pub recorded_at: String,
}
