//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::records::{Plan, RecordStore};
use crate::websocket::SubscriberRegistry;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription records
    pub store: Arc<RecordStore>,
    /// Live dashboard connections
    pub registry: Arc<SubscriberRegistry>,
    /// Plan catalogue
    pub plans: Arc<Vec<Plan>>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(store: Arc<RecordStore>, registry: Arc<SubscriberRegistry>, plans: Vec<Plan>) -> Self {
        Self {
            store,
            registry,
            plans: Arc::new(plans),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get live dashboard connection count
    pub async fn subscriber_count(&self) -> usize {
        self.registry.len().await
    }
}
