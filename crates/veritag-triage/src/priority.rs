//! Priority tiers and age computation for flagged assets.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use veritag_types::VeritagError;

/// Escalation tier of an open flag.
///
/// Variant order is queue order: `High` sorts before `Medium` before
/// `Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Operator-configurable tier cutoffs.
///
/// A flag open for at least `high_after` is [`Priority::High`], at least
/// `medium_after` is [`Priority::Medium`], anything younger is
/// [`Priority::Low`].  The constructor rejects cutoffs that would break
/// the monotonicity invariant (older is never lower priority than newer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriageThresholds {
    medium_after: Duration,
    high_after: Duration,
}

impl Default for TriageThresholds {
    /// Coarse default buckets: medium after 24 h, high after 72 h.
    fn default() -> Self {
        Self {
            medium_after: Duration::hours(24),
            high_after: Duration::hours(72),
        }
    }
}

impl TriageThresholds {
    /// Build thresholds from explicit cutoffs.
    ///
    /// # Errors
    ///
    /// [`VeritagError::Validation`] when `high_after < medium_after` or a
    /// cutoff is negative.
    pub fn new(medium_after: Duration, high_after: Duration) -> Result<Self, VeritagError> {
        if medium_after < Duration::zero() || high_after < Duration::zero() {
            return Err(VeritagError::Validation(
                "triage cutoffs must not be negative".to_string(),
            ));
        }
        if high_after < medium_after {
            return Err(VeritagError::Validation(format!(
                "high cutoff ({}h) must not be below medium cutoff ({}h)",
                high_after.num_hours(),
                medium_after.num_hours()
            )));
        }
        Ok(Self {
            medium_after,
            high_after,
        })
    }

    /// Convenience constructor over whole hours.
    ///
    /// Hour counts that overflow chrono's duration range are rejected as
    /// [`VeritagError::Validation`] rather than panicking; the values come
    /// from operator config and environment variables.
    pub fn from_hours(medium_after: i64, high_after: i64) -> Result<Self, VeritagError> {
        let medium = Duration::try_hours(medium_after).ok_or_else(|| {
            VeritagError::Validation(format!("medium cutoff ({medium_after}h) is out of range"))
        })?;
        let high = Duration::try_hours(high_after).ok_or_else(|| {
            VeritagError::Validation(format!("high cutoff ({high_after}h) is out of range"))
        })?;
        Self::new(medium, high)
    }

    pub fn medium_after(&self) -> Duration {
        self.medium_after
    }

    pub fn high_after(&self) -> Duration {
        self.high_after
    }
}

/// How long a flag has been open.  Clamped at zero: a flag timestamp in
/// the future (clock skew, bad data) reads as freshly opened rather than
/// producing a negative duration.
pub fn time_open(flagged_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - flagged_at).max(Duration::zero())
}

/// Tier a flag by how long it has been open.
///
/// Monotone in age: for the same `now`, an older flag is never a lower
/// tier than a newer one.  Never panics; malformed input clamps to
/// [`Priority::Low`].
pub fn priority(
    flagged_at: DateTime<Utc>,
    now: DateTime<Utc>,
    thresholds: &TriageThresholds,
) -> Priority {
    let age = time_open(flagged_at, now);
    if age >= thresholds.high_after {
        Priority::High
    } else if age >= thresholds.medium_after {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Format an age for display: `"Nh"` under 24 hours, `"Nd Mh"` after.
pub fn format_age(age: Duration) -> String {
    let hours = age.num_hours().max(0);
    if hours < 24 {
        format!("{hours}h")
    } else {
        format!("{}d {}h", hours / 24, hours % 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hours_ago: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(hours_ago)
    }

    #[test]
    fn default_buckets_tier_by_age() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        assert_eq!(priority(at(1, now), now, &th), Priority::Low);
        assert_eq!(priority(at(23, now), now, &th), Priority::Low);
        assert_eq!(priority(at(24, now), now, &th), Priority::Medium);
        assert_eq!(priority(at(71, now), now, &th), Priority::Medium);
        assert_eq!(priority(at(72, now), now, &th), Priority::High);
        assert_eq!(priority(at(500, now), now, &th), Priority::High);
    }

    #[test]
    fn priority_is_monotone_in_age() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        let mut ages: Vec<i64> = (0..200).step_by(7).collect();
        ages.sort_unstable();
        // Older flag (larger age) must never be a lower tier; Priority's
        // variant order makes "higher tier" compare smaller.
        for pair in ages.windows(2) {
            let newer = priority(at(pair[0], now), now, &th);
            let older = priority(at(pair[1], now), now, &th);
            assert!(older <= newer, "{}h vs {}h", pair[1], pair[0]);
        }
    }

    #[test]
    fn future_flag_timestamp_clamps_to_low() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        let future = now + Duration::hours(48);
        assert_eq!(priority(future, now, &th), Priority::Low);
        assert_eq!(time_open(future, now), Duration::zero());
    }

    #[test]
    fn thresholds_reject_inverted_cutoffs() {
        let err = TriageThresholds::from_hours(72, 24).unwrap_err();
        assert!(matches!(err, VeritagError::Validation(_)));
    }

    #[test]
    fn thresholds_reject_negative_cutoffs() {
        let err = TriageThresholds::from_hours(-1, 24).unwrap_err();
        assert!(matches!(err, VeritagError::Validation(_)));
    }

    #[test]
    fn thresholds_reject_out_of_range_cutoffs() {
        // A wildly large hour count from a config file or env var must
        // come back as a validation error, not a panic.
        let err = TriageThresholds::from_hours(0, 9_999_999_999_999_999).unwrap_err();
        assert!(matches!(err, VeritagError::Validation(_)));
        let err = TriageThresholds::from_hours(i64::MAX, i64::MAX).unwrap_err();
        assert!(matches!(err, VeritagError::Validation(_)));
    }

    #[test]
    fn equal_cutoffs_collapse_the_medium_tier() {
        let now = Utc::now();
        let th = TriageThresholds::from_hours(48, 48).unwrap();
        assert_eq!(priority(at(47, now), now, &th), Priority::Low);
        assert_eq!(priority(at(48, now), now, &th), Priority::High);
    }

    #[test]
    fn custom_cutoffs_shift_the_buckets() {
        let now = Utc::now();
        let th = TriageThresholds::from_hours(4, 12).unwrap();
        assert_eq!(priority(at(3, now), now, &th), Priority::Low);
        assert_eq!(priority(at(5, now), now, &th), Priority::Medium);
        assert_eq!(priority(at(13, now), now, &th), Priority::High);
    }

    #[test]
    fn format_under_a_day_is_hours_only() {
        assert_eq!(format_age(Duration::hours(0)), "0h");
        assert_eq!(format_age(Duration::hours(5)), "5h");
        assert_eq!(format_age(Duration::hours(23)), "23h");
    }

    #[test]
    fn format_a_day_or_more_is_days_and_hours() {
        assert_eq!(format_age(Duration::hours(24)), "1d 0h");
        assert_eq!(format_age(Duration::hours(51)), "2d 3h");
        assert_eq!(format_age(Duration::days(10) + Duration::hours(7)), "10d 7h");
    }

    #[test]
    fn format_clamps_negative_age() {
        assert_eq!(format_age(Duration::hours(-3)), "0h");
    }

    #[test]
    fn high_sorts_before_medium_before_low() {
        let mut tiers = vec![Priority::Low, Priority::High, Priority::Medium];
        tiers.sort();
        assert_eq!(tiers, vec![Priority::High, Priority::Medium, Priority::Low]);
    }
}
