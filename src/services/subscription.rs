// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription access evaluation.
//!
//! The stored [`SubscriptionRecord`] is the only source of truth; access
//! is always derived from it at request time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{SubscriptionRecord, SubscriptionStatus};
use crate::time_utils::parse_rfc3339;

const SECONDS_PER_DAY: i64 = 86_400;

/// Derived access state for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessState {
    pub is_premium: bool,
    pub is_in_trial: bool,
    /// Trial days remaining (trial only, 0 otherwise)
    pub days_left: i64,
    pub status: SubscriptionStatus,
}

impl AccessState {
    fn denied(status: SubscriptionStatus) -> Self {
        Self {
            is_premium: false,
            is_in_trial: false,
            days_left: 0,
            status,
        }
    }
}

/// Evaluate access for an optional record at `now`.
///
/// With `premium_override` set, every user is premium.
pub fn evaluate(
    record: Option<&SubscriptionRecord>,
    now: DateTime<Utc>,
    premium_override: bool,
) -> AccessState {
    let mut state = match record {
        None => AccessState::denied(SubscriptionStatus::None),
        Some(record) => evaluate_record(record, now),
    };
    if premium_override {
        state.is_premium = true;
    }
    state
}

fn evaluate_record(record: &SubscriptionRecord, now: DateTime<Utc>) -> AccessState {
    match record.status {
        SubscriptionStatus::Trial => {
            let Some(trial_end) = record.trial_end.as_deref().and_then(parse_rfc3339) else {
                return AccessState::denied(SubscriptionStatus::Trial);
            };
            let days_left = ceil_days(trial_end - now);
            AccessState {
                is_premium: days_left > 0,
                is_in_trial: days_left > 0,
                days_left: days_left.max(0),
                status: SubscriptionStatus::Trial,
            }
        }
        SubscriptionStatus::Active => {
            let not_expired = match record.expires_at.as_deref() {
                None => true,
                Some(raw) => parse_rfc3339(raw).is_some_and(|expires| expires > now),
            };
            AccessState {
                is_premium: not_expired,
                ..AccessState::denied(SubscriptionStatus::Active)
            }
        }
        SubscriptionStatus::Lifetime => AccessState {
            is_premium: true,
            ..AccessState::denied(SubscriptionStatus::Lifetime)
        },
        status => AccessState::denied(status),
    }
}

/// Ceiling of a duration in whole days.
fn ceil_days(remaining: chrono::Duration) -> i64 {
    let secs = remaining.num_seconds();
    secs.div_euclid(SECONDS_PER_DAY) + i64::from(secs.rem_euclid(SECONDS_PER_DAY) != 0)
}

/// Fail with 402 unless the state grants premium access.
pub fn require_premium(state: &AccessState) -> Result<()> {
    if state.is_premium {
        Ok(())
    } else {
        Err(AppError::PaymentRequired)
    }
}

/// Human-readable status line for the public subscription check.
pub fn status_message(state: &AccessState) -> &'static str {
    match (state.status, state.is_premium) {
        (SubscriptionStatus::Trial, true) => "Free trial in progress",
        (SubscriptionStatus::Trial, false) => "Free trial has ended",
        (SubscriptionStatus::Active, true) => "Subscription active",
        (SubscriptionStatus::Active, false) => "Subscription has expired",
        (SubscriptionStatus::Lifetime, _) => "Lifetime access",
        (SubscriptionStatus::Canceled, _) => "Subscription canceled",
        (SubscriptionStatus::Expired, _) => "Subscription has expired",
        (SubscriptionStatus::None, _) => "No subscription found",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    fn record(status: SubscriptionStatus) -> SubscriptionRecord {
        SubscriptionRecord {
            status,
            plan: None,
            created_at: "2025-05-01T00:00:00Z".to_string(),
            trial_end: None,
            expires_at: None,
            updated_at: "2025-05-01T00:00:00Z".to_string(),
            buyer_email: None,
            transaction: None,
            last_event: None,
        }
    }

    #[test]
    fn trial_days_left_rounds_up() {
        let mut r = record(SubscriptionStatus::Trial);
        r.trial_end = Some("2025-05-11T13:00:00Z".to_string());
        let state = evaluate(Some(&r), now(), false);
        assert!(state.is_premium);
        assert!(state.is_in_trial);
        assert_eq!(state.days_left, 2);

        r.trial_end = Some("2025-05-10T12:00:01Z".to_string());
        assert_eq!(evaluate(Some(&r), now(), false).days_left, 1);
    }

    #[test]
    fn trial_ended_is_not_premium() {
        let mut r = record(SubscriptionStatus::Trial);
        r.trial_end = Some("2025-05-10T12:00:00Z".to_string());
        let state = evaluate(Some(&r), now(), false);
        assert!(!state.is_premium);
        assert!(!state.is_in_trial);
        assert_eq!(state.days_left, 0);

        r.trial_end = Some("2025-05-01T00:00:00Z".to_string());
        assert_eq!(evaluate(Some(&r), now(), false).days_left, 0);
    }

    #[test]
    fn trial_without_end_is_not_premium() {
        let state = evaluate(Some(&record(SubscriptionStatus::Trial)), now(), false);
        assert!(!state.is_premium);
        assert_eq!(state.status, SubscriptionStatus::Trial);
    }

    #[test]
    fn active_respects_expiry() {
        let mut r = record(SubscriptionStatus::Active);
        assert!(evaluate(Some(&r), now(), false).is_premium);

        r.expires_at = Some("2025-06-01T00:00:00Z".to_string());
        assert!(evaluate(Some(&r), now(), false).is_premium);

        r.expires_at = Some("2025-05-01T00:00:00Z".to_string());
        assert!(!evaluate(Some(&r), now(), false).is_premium);
    }

    #[test]
    fn terminal_statuses_are_not_premium() {
        assert!(evaluate(Some(&record(SubscriptionStatus::Lifetime)), now(), false).is_premium);
        for status in [
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Expired,
            SubscriptionStatus::None,
        ] {
            assert!(!evaluate(Some(&record(status)), now(), false).is_premium);
        }
        assert!(!evaluate(None, now(), false).is_premium);
    }

    #[test]
    fn override_forces_premium() {
        let state = evaluate(None, now(), true);
        assert!(state.is_premium);
        assert_eq!(state.status, SubscriptionStatus::None);
        assert!(require_premium(&state).is_ok());
        assert!(matches!(
            require_premium(&evaluate(None, now(), false)),
            Err(AppError::PaymentRequired)
        ));
    }
}
