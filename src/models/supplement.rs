//! Supplement tracking.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A supplement the user takes, stored at `users/{user_id}/supplements/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Supplement {
    /// `sup_<unix millis>`
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    /// When it is taken, e.g. "morning" or "post_workout"
    #[serde(default)]
    pub timing: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
