//! Remediation-queue ordering.
//!
//! Sort contract: primary key priority (high before medium before low),
//! secondary key `flagged_at` ascending (oldest first) within a tier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use veritag_types::FlagRecord;

use crate::priority::{Priority, TriageThresholds, format_age, priority, time_open};

/// A flag record annotated for queue display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriagedFlag {
    pub record: FlagRecord,
    pub priority: Priority,
    /// Formatted time-open, e.g. `"5h"` or `"2d 3h"`.
    pub age: String,
}

/// Order `records` in place per the queue contract.
pub fn sort_queue(records: &mut [FlagRecord], now: DateTime<Utc>, thresholds: &TriageThresholds) {
    records.sort_by_key(|r| (priority(r.flagged_at, now, thresholds), r.flagged_at));
}

/// Build the ordered, display-annotated remediation queue.
pub fn triage(
    records: &[FlagRecord],
    now: DateTime<Utc>,
    thresholds: &TriageThresholds,
) -> Vec<TriagedFlag> {
    let mut sorted = records.to_vec();
    sort_queue(&mut sorted, now, thresholds);
    debug!(open_flags = sorted.len(), "triage queue rebuilt");
    sorted
        .into_iter()
        .map(|record| {
            let tier = priority(record.flagged_at, now, thresholds);
            let age = format_age(time_open(record.flagged_at, now));
            TriagedFlag {
                record,
                priority: tier,
                age,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use veritag_types::{Address, AssetId};

    fn record(hours_ago: i64, now: DateTime<Utc>) -> FlagRecord {
        FlagRecord {
            asset_id: AssetId::new(),
            flagged_by: Address::from("0xreporter"),
            flagged_at: now - Duration::hours(hours_ago),
            reason: format!("report filed {hours_ago}h ago"),
        }
    }

    #[test]
    fn queue_orders_by_tier_then_oldest_first() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        // low(2h), high(100h), medium(30h), high(80h), low(5h)
        let mut records = vec![
            record(2, now),
            record(100, now),
            record(30, now),
            record(80, now),
            record(5, now),
        ];
        sort_queue(&mut records, now, &th);
        let ages: Vec<i64> = records
            .iter()
            .map(|r| (now - r.flagged_at).num_hours())
            .collect();
        assert_eq!(ages, vec![100, 80, 30, 5, 2]);
    }

    #[test]
    fn within_a_tier_the_oldest_flag_comes_first() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        let mut records = vec![record(3, now), record(20, now), record(10, now)];
        sort_queue(&mut records, now, &th);
        let ages: Vec<i64> = records
            .iter()
            .map(|r| (now - r.flagged_at).num_hours())
            .collect();
        assert_eq!(ages, vec![20, 10, 3]);
    }

    #[test]
    fn triage_annotates_tier_and_age() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        let queue = triage(&[record(51, now), record(2, now)], now, &th);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].priority, Priority::Medium);
        assert_eq!(queue[0].age, "2d 3h");
        assert_eq!(queue[1].priority, Priority::Low);
        assert_eq!(queue[1].age, "2h");
    }

    #[test]
    fn empty_queue_is_fine() {
        let now = Utc::now();
        assert!(triage(&[], now, &TriageThresholds::default()).is_empty());
    }

    #[test]
    fn bad_timestamps_do_not_panic_and_sort_last() {
        let now = Utc::now();
        let th = TriageThresholds::default();
        let future = FlagRecord {
            asset_id: AssetId::new(),
            flagged_by: Address::from("0xskewed"),
            flagged_at: now + Duration::hours(6),
            reason: "clock-skewed reporter".to_string(),
        };
        let queue = triage(&[future.clone(), record(90, now)], now, &th);
        assert_eq!(queue[0].priority, Priority::High);
        assert_eq!(queue[1].priority, Priority::Low);
        assert_eq!(queue[1].age, "0h");
        assert_eq!(queue[1].record.flagged_by, future.flagged_by);
    }
}
