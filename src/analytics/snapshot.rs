//! Snapshot computation
//!
//! Turns a consistent view of the record list into the aggregate numbers
//! the dashboard shows. Everything here is a pure function of its inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{BillingCycle, Subscription, SubscriptionStatus};

/// Default number of records attached to a snapshot
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Aggregate counters and derived ratios over all subscriptions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_subscriptions: usize,
    pub active_subscriptions: usize,
    pub trial_subscriptions: usize,
    pub cancelled_subscriptions: usize,
    pub expired_subscriptions: usize,
    /// Sum of active monthly amounts
    pub monthly_revenue: f64,
    /// Sum of active yearly amounts
    pub yearly_revenue: f64,
    /// Cancelled share of all subscriptions, in percent
    pub churn_rate: f64,
    pub average_revenue_per_user: f64,
    pub new_subscriptions_today: usize,
    pub cancellations_today: usize,
}

impl Analytics {
    /// Records whose status is none of the four recognized ones
    pub fn unrecognized_subscriptions(&self) -> usize {
        self.total_subscriptions
            - self.active_subscriptions
            - self.trial_subscriptions
            - self.cancelled_subscriptions
            - self.expired_subscriptions
    }
}

/// Immutable result of one computation
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub analytics: Analytics,
    /// Most recently inserted records, oldest first
    pub recent_subscriptions: Vec<Subscription>,
    /// Instant the snapshot was computed for
    pub computed_at: DateTime<Utc>,
}

impl Snapshot {
    /// Wall-clock time of computation as `HH:MM:SS` (UTC)
    pub fn timestamp(&self) -> String {
        self.computed_at.format("%H:%M:%S").to_string()
    }
}

/// Errors that make a snapshot impossible to compute
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Subscription {id} has a non-finite amount ({amount})")]
    InvalidAmount { id: u64, amount: f64 },
}

/// Compute a snapshot over `records` as of `now`
///
/// One pass over the records. Calendar days are compared in UTC.
/// Unrecognized statuses only count toward the total, and billing cycles
/// other than monthly/yearly contribute no revenue.
pub fn compute(
    records: &[Subscription],
    now: DateTime<Utc>,
    recent_limit: usize,
) -> Result<Snapshot, SnapshotError> {
    let today = now.date_naive();
    let mut analytics = Analytics::default();

    for record in records {
        if !record.amount.is_finite() {
            return Err(SnapshotError::InvalidAmount {
                id: record.id,
                amount: record.amount,
            });
        }

        analytics.total_subscriptions += 1;

        match record.status {
            SubscriptionStatus::Active => {
                analytics.active_subscriptions += 1;
                match record.billing_cycle {
                    BillingCycle::Monthly => analytics.monthly_revenue += record.amount,
                    BillingCycle::Yearly => analytics.yearly_revenue += record.amount,
                    BillingCycle::Other(_) => {}
                }
            }
            SubscriptionStatus::Trial => analytics.trial_subscriptions += 1,
            SubscriptionStatus::Cancelled => {
                analytics.cancelled_subscriptions += 1;
                if record.updated_at.date_naive() == today {
                    analytics.cancellations_today += 1;
                }
            }
            SubscriptionStatus::Expired => analytics.expired_subscriptions += 1,
            SubscriptionStatus::Other(_) => {}
        }

        if record.created_at.date_naive() == today {
            analytics.new_subscriptions_today += 1;
        }
    }

    analytics.churn_rate = churn_rate(
        analytics.cancelled_subscriptions,
        analytics.total_subscriptions,
    );
    analytics.average_revenue_per_user = average_revenue_per_user(
        analytics.monthly_revenue,
        analytics.yearly_revenue,
        analytics.active_subscriptions,
    );

    let start = records.len().saturating_sub(recent_limit);

    Ok(Snapshot {
        analytics,
        recent_subscriptions: records[start..].to_vec(),
        computed_at: now,
    })
}

fn churn_rate(cancelled: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    cancelled as f64 / total as f64 * 100.0
}

fn average_revenue_per_user(monthly: f64, yearly: f64, active: usize) -> f64 {
    if active == 0 {
        return 0.0;
    }
    (monthly + yearly / 12.0) / active as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Plan;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 14, 3, 27).unwrap()
    }

    fn record(id: u64, status: &str, cycle: &str, amount: f64) -> Subscription {
        let plan = Plan::new(1, "Basic", "", amount, BillingCycle::Monthly);
        let mut sub = Subscription::new(id, "John Doe", &plan)
            .status(status.to_string().into())
            .billing(amount, cycle.to_string().into())
            .created(now() - Duration::days(40));
        sub.id = id;
        sub
    }

    #[test]
    fn test_three_record_scenario() {
        let records = vec![
            record(1, "active", "monthly", 10.0),
            record(2, "active", "yearly", 120.0),
            record(3, "cancelled", "monthly", 9.99),
        ];

        let snap = compute(&records, now(), DEFAULT_RECENT_LIMIT).unwrap();
        let a = &snap.analytics;

        assert_eq!(a.total_subscriptions, 3);
        assert_eq!(a.active_subscriptions, 2);
        assert_eq!(a.cancelled_subscriptions, 1);
        assert_eq!(a.monthly_revenue, 10.0);
        assert_eq!(a.yearly_revenue, 120.0);
        assert!((a.churn_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((a.average_revenue_per_user - 10.0).abs() < 1e-9);
        assert_eq!(snap.recent_subscriptions.len(), 3);
    }

    #[test]
    fn test_empty_records() {
        let snap = compute(&[], now(), DEFAULT_RECENT_LIMIT).unwrap();

        assert_eq!(snap.analytics.total_subscriptions, 0);
        assert_eq!(snap.analytics.churn_rate, 0.0);
        assert_eq!(snap.analytics.average_revenue_per_user, 0.0);
        assert!(snap.recent_subscriptions.is_empty());
    }

    #[test]
    fn test_recent_sample_is_last_ten_in_order() {
        let records: Vec<_> = (1..=15).map(|i| record(i, "trial", "monthly", 1.0)).collect();

        let snap = compute(&records, now(), DEFAULT_RECENT_LIMIT).unwrap();
        let ids: Vec<u64> = snap.recent_subscriptions.iter().map(|r| r.id).collect();

        assert_eq!(ids, (6..=15).collect::<Vec<_>>());
    }

    #[test]
    fn test_status_buckets_and_unrecognized() {
        let records = vec![
            record(1, "active", "monthly", 5.0),
            record(2, "trial", "monthly", 5.0),
            record(3, "cancelled", "monthly", 5.0),
            record(4, "expired", "monthly", 5.0),
            record(5, "paused", "monthly", 5.0),
            record(6, "", "monthly", 5.0),
        ];

        let a = compute(&records, now(), 0).unwrap().analytics;

        assert_eq!(a.total_subscriptions, records.len());
        assert_eq!(a.expired_subscriptions, 1);
        assert_eq!(a.unrecognized_subscriptions(), 2);
        assert_eq!(
            a.active_subscriptions
                + a.trial_subscriptions
                + a.cancelled_subscriptions
                + a.expired_subscriptions
                + a.unrecognized_subscriptions(),
            a.total_subscriptions
        );
    }

    #[test]
    fn test_unknown_cycle_and_inactive_records_earn_nothing() {
        let records = vec![
            record(1, "active", "weekly", 50.0),
            record(2, "trial", "monthly", 50.0),
            record(3, "expired", "yearly", 50.0),
        ];

        let a = compute(&records, now(), 0).unwrap().analytics;

        assert_eq!(a.monthly_revenue, 0.0);
        assert_eq!(a.yearly_revenue, 0.0);
        assert_eq!(a.active_subscriptions, 1);
        assert_eq!(a.average_revenue_per_user, 0.0);
    }

    #[test]
    fn test_today_counters() {
        let today_morning = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 1).unwrap();
        let yesterday_late = Utc.with_ymd_and_hms(2024, 6, 14, 23, 59, 59).unwrap();

        let new_today = record(1, "active", "monthly", 1.0).created(today_morning);
        let old = record(2, "active", "monthly", 1.0).created(yesterday_late);
        let cancelled_today = record(3, "cancelled", "monthly", 1.0).updated(today_morning);
        let cancelled_before = record(4, "cancelled", "monthly", 1.0).updated(yesterday_late);
        let trial_touched_today = record(5, "trial", "monthly", 1.0).updated(today_morning);

        let records = vec![new_today, old, cancelled_today, cancelled_before, trial_touched_today];
        let a = compute(&records, now(), 0).unwrap().analytics;

        assert_eq!(a.new_subscriptions_today, 1);
        assert_eq!(a.cancellations_today, 1);
    }

    #[test]
    fn test_churn_rate_bounds() {
        let all_cancelled: Vec<_> = (1..=4).map(|i| record(i, "cancelled", "monthly", 1.0)).collect();
        let a = compute(&all_cancelled, now(), 0).unwrap().analytics;
        assert_eq!(a.churn_rate, 100.0);

        let none_cancelled: Vec<_> = (1..=4).map(|i| record(i, "active", "monthly", 1.0)).collect();
        let a = compute(&none_cancelled, now(), 0).unwrap().analytics;
        assert_eq!(a.churn_rate, 0.0);
    }

    #[test]
    fn test_compute_is_deterministic_and_non_mutating() {
        let records: Vec<_> = (1..=12).map(|i| record(i, "active", "yearly", i as f64)).collect();
        let before = records.clone();

        let first = compute(&records, now(), DEFAULT_RECENT_LIMIT).unwrap();
        let second = compute(&records, now(), DEFAULT_RECENT_LIMIT).unwrap();

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn test_non_finite_amount_is_rejected() {
        let records = vec![
            record(1, "active", "monthly", 1.0),
            record(2, "trial", "monthly", f64::NAN),
        ];

        let err = compute(&records, now(), 0).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidAmount { id: 2, .. }));
    }

    #[test]
    fn test_timestamp_format() {
        let snap = compute(&[], now(), 0).unwrap();
        assert_eq!(snap.timestamp(), "14:03:27");
    }
}
