//! Subscription Analytics
//!
//! Aggregates the record list into the numbers shown on the dashboard.
//! See [`compute`] for the exact definitions.

mod snapshot;

pub use snapshot::{compute, Analytics, Snapshot, SnapshotError, DEFAULT_RECENT_LIMIT};
