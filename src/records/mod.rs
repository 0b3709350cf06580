//! Subscription Records
//!
//! The business data the analytics feed summarizes:
//!
//! - [`types`]: `Subscription`, `Plan` and their classification enums
//! - [`store`]: Thread-safe record list with CRUD and pagination
//! - [`sample`]: Plan catalogue and seed data generation

pub mod sample;
pub mod store;
pub mod types;

pub use sample::{default_plans, generate_subscriptions};
pub use store::{Page, RecordStore, StoreError};
pub use types::{BillingCycle, Plan, Subscription, SubscriptionStatus};
