// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription records.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Subscription status as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SubscriptionStatus {
    /// Free trial until `trial_end`
    Trial,
    /// Paid, until `expires_at` if set
    Active,
    /// Paid once, never expires
    Lifetime,
    Canceled,
    Expired,
    /// No subscription, or a status this version does not know
    #[default]
    #[serde(other)]
    None,
}

/// Subscription record, stored at `users/{user_id}/subscription/current`
/// (or `subscriptionsByEmail/{email}` until the buyer registers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub status: SubscriptionStatus,
    /// Plan or product identifier
    #[serde(default)]
    pub plan: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub trial_end: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    pub updated_at: String,
    // ─── Payment provider fields ─────────────────────────────────
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    /// Last provider event applied (e.g. `PURCHASE_APPROVED`)
    #[serde(default)]
    pub last_event: Option<String>,
}

impl SubscriptionRecord {
    /// A new free trial lasting `days` from `now`.
    pub fn new_trial(now: chrono::DateTime<chrono::Utc>, days: i64) -> Self {
        let now_str = crate::time_utils::format_utc_rfc3339(now);
        Self {
            status: SubscriptionStatus::Trial,
            plan: None,
            created_at: now_str.clone(),
            trial_end: Some(crate::time_utils::format_utc_rfc3339(
                now + chrono::Duration::days(days),
            )),
            expires_at: None,
            updated_at: now_str,
            buyer_email: None,
            transaction: None,
            last_event: None,
        }
    }
}
