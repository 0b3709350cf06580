//! WebSocket Message Types
//!
//! Defines the payloads exchanged between dashboards and the server.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{Analytics, Snapshot};
use crate::records::Subscription;

/// Live analytics update broadcast to every dashboard on each tick
#[derive(Debug, Serialize)]
pub struct RealtimeMessage<'a> {
    pub analytics: &'a Analytics,
    pub recent_subscriptions: &'a [Subscription],
    /// Time of computation, `HH:MM:SS`
    pub timestamp: String,
}

impl<'a> RealtimeMessage<'a> {
    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        Self {
            analytics: &snapshot.analytics,
            recent_subscriptions: &snapshot.recent_subscriptions,
            timestamp: snapshot.timestamp(),
        }
    }

    /// Serialize to the JSON text shared by all subscribers of a tick
    pub fn encode(&self) -> Result<Arc<str>, serde_json::Error> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for keepalive
    Ping,
}

/// Direct replies from server to a single client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Pong response to ping
    Pong,
}

impl ServerMessage {
    pub fn encode(&self) -> Result<Arc<str>, serde_json::Error> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::compute;
    use crate::records::{BillingCycle, Plan, SubscriptionStatus};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    #[test]
    fn test_realtime_message_shape() {
        let plan = Plan::new(1, "Basic", "Perfect for individuals", 9.99, BillingCycle::Monthly);
        let mut sub = Subscription::new(1, "John Doe", &plan).status(SubscriptionStatus::Trial);
        sub.id = 1;
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 5, 0).unwrap();

        let snapshot = compute(&[sub], now, 10).unwrap();
        let text = RealtimeMessage::from_snapshot(&snapshot).encode().unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["timestamp"], "09:05:00");
        assert_eq!(json["analytics"]["total_subscriptions"], 1);
        assert_eq!(json["analytics"]["trial_subscriptions"], 1);
        assert_eq!(json["analytics"]["churn_rate"], 0.0);
        assert!(json["analytics"]["new_subscriptions_today"].is_number());
        assert!(json["analytics"]["cancellations_today"].is_number());

        let recent = json["recent_subscriptions"].as_array().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0]["status"], "trial");
        assert_eq!(recent[0]["billing_cycle"], "monthly");
        assert_eq!(recent[0]["plan_name"], "Basic");
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "subscribe"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialize_pong() {
        let text = ServerMessage::Pong.encode().unwrap();
        assert_eq!(&*text, r#"{"type":"pong"}"#);
    }
}
