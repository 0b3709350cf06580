//! # SubPulse
//!
//! Subscription management backend with a live analytics feed.
//!
//! ## Features
//!
//! - **Live dashboards**: every connected WebSocket receives the same
//!   analytics snapshot on a fixed cadence
//! - **Failure isolation**: a dead or slow dashboard is dropped without
//!   delaying the others
//! - **REST API**: CRUD over subscriptions, plan catalogue, on-demand analytics
//!
//! ## Modules
//!
//! - [`records`]: Subscription records, the record store, and sample data
//! - [`analytics`]: Pure snapshot computation
//! - [`websocket`]: Subscriber registry, publisher loop, and WebSocket ingress
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use subpulse::{AppState, Config, Publisher, RecordStore, SubscriberRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(RecordStore::new());
//!     let registry = Arc::new(SubscriberRegistry::new());
//!
//!     // Start broadcasting snapshots
//!     let publisher = Arc::new(Publisher::new(
//!         Arc::clone(&registry),
//!         Arc::clone(&store),
//!         config.hub.publisher_config(),
//!     ));
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     publisher.start(shutdown_rx);
//!
//!     let state = AppState::new(store, registry, subpulse::default_plans());
//!     subpulse::serve(state, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod records;
pub mod websocket;

pub use analytics::{compute, Analytics, Snapshot, SnapshotError};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, HubConfig, LoggingConfig, SeedConfig, ServerConfig};

pub use records::{
    default_plans, generate_subscriptions, BillingCycle, Plan, RecordStore, StoreError,
    Subscription, SubscriptionStatus,
};

pub use websocket::{
    websocket_handler, BroadcastReport, PublishError, Publisher, PublisherConfig,
    RealtimeMessage, Subscriber, SubscriberError, SubscriberHandle, SubscriberRegistry,
    TickReport,
};
