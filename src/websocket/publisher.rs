//! Snapshot Publisher
//!
//! Drives the live feed: on every tick it computes a snapshot over the
//! current records, serializes it once, and broadcasts the same bytes to
//! every registered subscriber.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::hub::SubscriberRegistry;
use super::messages::RealtimeMessage;
use crate::analytics::{compute, SnapshotError, DEFAULT_RECENT_LIMIT};
use crate::records::RecordStore;

/// Configuration for the publisher loop
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Time between ticks
    pub tick_interval: Duration,
    /// Number of recent records attached to each snapshot
    pub recent_limit: usize,
    /// Upper bound on a single subscriber send
    pub send_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            recent_limit: DEFAULT_RECENT_LIMIT,
            send_timeout: Duration::from_secs(3),
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub total_records: usize,
    pub delivered: usize,
    pub dropped: usize,
}

/// Errors that cause a tick to be skipped
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Snapshot computation failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Periodically broadcasts analytics snapshots
pub struct Publisher {
    registry: Arc<SubscriberRegistry>,
    store: Arc<RecordStore>,
    config: PublisherConfig,
}

impl Publisher {
    /// Create a new publisher
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        store: Arc<RecordStore>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Get the publisher configuration
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Run one tick as of the current time
    pub async fn tick(&self) -> Result<TickReport, PublishError> {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick as of `now`
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<TickReport, PublishError> {
        let records = self.store.current_records().await;
        let snapshot = compute(&records, now, self.config.recent_limit)?;
        let payload = RealtimeMessage::from_snapshot(&snapshot).encode()?;

        let report = self
            .registry
            .broadcast(payload, self.config.send_timeout)
            .await;

        Ok(TickReport {
            total_records: records.len(),
            delivered: report.delivered,
            dropped: report.dropped,
        })
    }

    /// Start the background tick loop
    ///
    /// The first tick fires one interval after start. The loop ends once
    /// `shutdown` turns `true` or its sender is dropped.
    pub fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let period = self.config.tick_interval.max(Duration::from_millis(1));

        tracing::info!(
            interval_ms = period.as_millis() as u64,
            recent_limit = self.config.recent_limit,
            "Starting analytics publisher"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.tick().await {
                            Ok(report) if report.delivered + report.dropped > 0 => {
                                tracing::debug!(
                                    records = report.total_records,
                                    delivered = report.delivered,
                                    dropped = report.dropped,
                                    "Broadcast analytics snapshot"
                                );
                            }
                            Ok(_) => {
                                tracing::trace!("No subscribers, snapshot not sent");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Skipping analytics tick");
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Analytics publisher stopped");
        })
    }
}
