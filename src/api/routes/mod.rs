//! API Route Handlers

pub mod analytics;
pub mod health;
pub mod subscriptions;
