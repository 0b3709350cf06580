//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.
//! Each socket becomes a [`WsSubscriber`] in the registry until its receive
//! half reports an error or a close frame.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::hub::SubscriberRegistry;
use super::messages::{ClientMessage, ServerMessage};
use super::subscriber::{Subscriber, SubscriberError, SubscriberHandle};
use crate::api::AppState;

/// Write half of a dashboard WebSocket
pub struct WsSubscriber {
    id: String,
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsSubscriber {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl Subscriber for WsSubscriber {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, payload: Arc<str>) -> Result<(), SubscriberError> {
        // axum 0.7 frames own their text, so each subscriber gets a copy of the encoded bytes
        self.sink
            .lock()
            .await
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|e| SubscriberError::Transport(e.to_string()))
    }

    async fn close(&self) {
        let _ = self.sink.lock().await.close().await;
    }
}

/// WebSocket upgrade handler
///
/// This is the entry point for live dashboard connections.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, registry: Arc<SubscriberRegistry>) {
    let (sink, mut receiver) = socket.split();

    let subscriber = Arc::new(WsSubscriber::new(sink));
    let handle: SubscriberHandle = Arc::clone(&subscriber) as SubscriberHandle;

    registry.add(Arc::clone(&handle)).await;
    let subscribers = registry.len().await;
    tracing::info!(
        connection_id = %subscriber.id(),
        subscribers,
        "Dashboard connected"
    );

    while let Some(result) = receiver.next().await {
        match result {
            Ok(msg) => {
                if !handle_ws_message(&subscriber, msg).await {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %subscriber.id(),
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
        }
    }

    // The publisher may already have dropped us after a failed send
    registry.remove(&handle).await;
    subscriber.close().await;

    tracing::info!(connection_id = %subscriber.id(), "Dashboard disconnected");
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(subscriber: &WsSubscriber, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    if let Ok(pong) = ServerMessage::Pong.encode() {
                        if subscriber.send(pong).await.is_err() {
                            return false;
                        }
                    }
                }
                Err(_) => {
                    tracing::trace!(
                        connection_id = %subscriber.id(),
                        "Ignoring client message"
                    );
                }
            }
            true
        }
        // Axum answers ping frames itself
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %subscriber.id(), "Client requested close");
            false
        }
    }
}
