//! Subscriber contract
//!
//! The hub treats every connection as "something that can be sent bytes and
//! closed". The transport layer supplies the implementation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A live connection that receives broadcast payloads
///
/// Identity is the allocation behind the `Arc`, so the same handle can be
/// added and removed from any task without agreeing on an id.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Diagnostic identifier, used for logging only
    fn id(&self) -> &str;

    /// Deliver one payload
    ///
    /// Any error means the subscriber is dead and will be dropped.
    async fn send(&self, payload: Arc<str>) -> Result<(), SubscriberError>;

    /// Close the underlying transport, ignoring failures
    async fn close(&self);
}

/// Shared handle to a subscriber
pub type SubscriberHandle = Arc<dyn Subscriber>;

/// Why a send to a subscriber failed
#[derive(Debug, Clone, Error)]
pub enum SubscriberError {
    #[error("Subscriber connection closed")]
    Closed,

    #[error("Send timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),
}
