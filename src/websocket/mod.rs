//! WebSocket Live Analytics Feed
//!
//! Pushes an analytics snapshot to every connected dashboard at a fixed
//! interval.
//!
//! ## Architecture
//!
//! - **SubscriberRegistry**: The set of live connections and the fan-out
//! - **Publisher**: Background tick loop that computes and broadcasts snapshots
//! - **Handler**: WebSocket upgrade, registration and disconnect detection
//! - **Messages**: Wire format of the broadcast payload
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   console.log(data.timestamp, data.analytics.churn_rate);
//! };
//! ```

mod handler;
mod hub;
mod messages;
mod publisher;
mod subscriber;

pub use handler::{websocket_handler, WsSubscriber};
pub use hub::{BroadcastReport, FanOut, SubscriberRegistry};
pub use messages::{ClientMessage, RealtimeMessage, ServerMessage};
pub use publisher::{PublishError, Publisher, PublisherConfig, TickReport};
pub use subscriber::{Subscriber, SubscriberError, SubscriberHandle};
