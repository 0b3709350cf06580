//! Sample Data
//!
//! Plan catalogue and randomly generated subscriptions used to seed a fresh
//! server so the dashboard has something to show.

use chrono::{DateTime, Duration, Months, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{BillingCycle, Plan, Subscription, SubscriptionStatus};

const USER_NAMES: &[&str] = &[
    "John Doe",
    "Jane Smith",
    "Bob Johnson",
    "Alice Brown",
    "Charlie Wilson",
    "Diana Davis",
    "Eve Miller",
    "Frank Garcia",
    "Grace Martinez",
    "Henry Rodriguez",
];

/// The fixed plan catalogue
pub fn default_plans() -> Vec<Plan> {
    vec![
        Plan::new(1, "Basic", "Perfect for individuals", 9.99, BillingCycle::Monthly)
            .features(&["5 Projects", "10GB Storage", "Email Support"]),
        Plan::new(2, "Pro", "Great for small teams", 29.99, BillingCycle::Monthly).features(&[
            "Unlimited Projects",
            "100GB Storage",
            "Priority Support",
            "Advanced Analytics",
        ]),
        Plan::new(3, "Enterprise", "For large organizations", 99.99, BillingCycle::Monthly)
            .features(&[
                "Everything in Pro",
                "Unlimited Storage",
                "24/7 Phone Support",
                "Custom Integrations",
            ]),
        Plan::new(4, "Basic Yearly", "Basic plan billed yearly", 99.99, BillingCycle::Yearly)
            .features(&["5 Projects", "10GB Storage", "Email Support"]),
        Plan::new(5, "Pro Yearly", "Pro plan billed yearly", 299.99, BillingCycle::Yearly)
            .features(&[
                "Unlimited Projects",
                "100GB Storage",
                "Priority Support",
                "Advanced Analytics",
            ]),
    ]
}

/// Generate `count` subscriptions with ids `1..=count`
///
/// Each record picks a random plan and status and starts up to a year
/// before `now`. Returns an empty list when `plans` is empty.
pub fn generate_subscriptions<R: Rng>(
    plans: &[Plan],
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Subscription> {
    let statuses = SubscriptionStatus::all();
    let mut records = Vec::with_capacity(count);

    for i in 1..=count as u64 {
        let (Some(plan), Some(status), Some(name)) = (
            plans.choose(rng),
            statuses.choose(rng),
            USER_NAMES.choose(rng),
        ) else {
            break;
        };

        let months_back = Months::new(rng.gen_range(0..12));
        let days_back = Duration::days(rng.gen_range(0..30));
        let start = now.checked_sub_months(months_back).unwrap_or(now) - days_back;

        let mut record = Subscription::new(i, *name, plan)
            .status(status.clone())
            .created(start)
            .updated(now);
        record.id = i;
        records.push(record);
    }

    records
}
