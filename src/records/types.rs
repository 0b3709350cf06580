//! Core data types for subscription records
//!
//! This module defines the business entities the rest of the crate reads:
//! - `Subscription`: A single customer subscription
//! - `Plan`: A purchasable plan from the catalogue
//! - `SubscriptionStatus` and `BillingCycle`: Classification enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single customer subscription
///
/// Owned by the record store. The analytics hub only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub user_email: String,
    pub plan_id: u64,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Price charged per billing cycle
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a subscription for a user on a plan, starting now
    pub fn new(user_id: u64, user_name: impl Into<String>, plan: &Plan) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            user_name: user_name.into(),
            user_email: format!("user{}@example.com", user_id),
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: plan.interval.advance(now),
            amount: plan.price,
            currency: plan.currency.clone(),
            billing_cycle: plan.interval.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder method: set status
    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder method: set amount and billing cycle
    pub fn billing(mut self, amount: f64, cycle: BillingCycle) -> Self {
        self.amount = amount;
        self.billing_cycle = cycle;
        self
    }

    /// Builder method: set creation and update instants
    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.start_date = at;
        self.end_date = self.billing_cycle.advance(at);
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Builder method: set the last update instant
    pub fn updated(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }
}

/// Lifecycle state of a subscription
///
/// Unknown strings are kept verbatim in `Other` so records written by
/// clients round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Cancelled,
    Expired,
    Other(String),
}

impl SubscriptionStatus {
    /// The four recognized states
    pub fn all() -> &'static [SubscriptionStatus] {
        &[
            SubscriptionStatus::Active,
            SubscriptionStatus::Trial,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Other(s) => s,
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => SubscriptionStatus::Active,
            "trial" => SubscriptionStatus::Trial,
            "cancelled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Other(s),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a subscription is billed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Other(String),
}

impl BillingCycle {
    pub fn as_str(&self) -> &str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Other(s) => s,
        }
    }

    /// End of one billing period starting at `start`
    ///
    /// Unknown cycles are treated as monthly.
    pub fn advance(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            BillingCycle::Yearly => 12,
            _ => 1,
        };
        start
            .checked_add_months(chrono::Months::new(months))
            .unwrap_or(start)
    }
}

impl From<String> for BillingCycle {
    fn from(s: String) -> Self {
        match s.as_str() {
            "monthly" => BillingCycle::Monthly,
            "yearly" => BillingCycle::Yearly,
            _ => BillingCycle::Other(s),
        }
    }
}

impl From<BillingCycle> for String {
    fn from(cycle: BillingCycle) -> Self {
        match cycle {
            BillingCycle::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plan from the catalogue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub interval: BillingCycle,
    pub features: Vec<String>,
    pub active: bool,
}

impl Plan {
    /// Create an active USD plan
    pub fn new(id: u64, name: &str, description: &str, price: f64, interval: BillingCycle) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price,
            currency: "USD".to_string(),
            interval,
            features: Vec::new(),
            active: true,
        }
    }

    /// Builder method: set feature list
    pub fn features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|f| f.to_string()).collect();
        self
    }
}
