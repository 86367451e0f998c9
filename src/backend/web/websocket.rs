use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::backend::twitch::ChatEvent;

/// Maximum number of messages that can be buffered in the broadcast channel
const CHANNEL_CAPACITY: usize = 100;

/// Events pushed to the local UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// A chat message was received
    Chat(ChatEvent),
    /// A viewer joined the giveaway
    GiveawayEntry { user_name: String, entrants: usize },
    /// The broadcaster asked for a winner to be drawn from these entrants
    GiveawayDraw { entrants: Vec<String> },
}

/// Narrow sink for UI-facing events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

/// Shared state for WebSocket connections
#[derive(Clone)]
pub struct WebSocketState {
    /// Broadcast channel for sending events to all connected clients
    tx: broadcast::Sender<UiEvent>,
    /// Counter for connected clients
    client_count: Arc<RwLock<usize>>,
}

impl WebSocketState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            client_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Get the number of connected clients
    pub async fn client_count(&self) -> usize {
        *self.client_count.read().await
    }

    fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }
}

impl Default for WebSocketState {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for WebSocketState {
    fn emit(&self, event: UiEvent) {
        // No receivers just means no UI is open right now
        if self.tx.send(event).is_err() {
            log::debug!("No UI clients connected, event dropped");
        }
    }
}

/// WebSocket handler for UI connections
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebSocketState>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    {
        let mut count = state.client_count.write().await;
        *count += 1;
        log::info!("UI client connected. Total clients: {}", *count);
    }

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("UI client lagged, skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    log::error!("Failed to serialize UI event: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                log::debug!("Client disconnected during send");
                break;
            }
        }
    });

    // The UI never sends anything meaningful; drain until it closes
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                log::debug!("Client sent close message");
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    {
        let mut count = state.client_count.write().await;
        *count = count.saturating_sub(1);
        log::info!("UI client disconnected. Total clients: {}", *count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_websocket_state_creation() {
        let state = WebSocketState::new();
        assert_eq!(state.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let state = WebSocketState::new();
        let mut rx = state.subscribe();

        state.emit(UiEvent::GiveawayDraw {
            entrants: vec!["alice".to_string()],
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            UiEvent::GiveawayDraw {
                entrants: vec!["alice".to_string()]
            }
        );
    }

    #[test]
    fn test_emit_without_subscribers_does_not_panic() {
        WebSocketState::new().emit(UiEvent::GiveawayEntry {
            user_name: "bob".to_string(),
            entrants: 1,
        });
    }

    #[test]
    fn test_chat_event_wire_format() {
        let event = UiEvent::Chat(ChatEvent {
            channel: "streamer".to_string(),
            user: "viewer".to_string(),
            message: "hello".to_string(),
            broadcaster: false,
            moderator: true,
        });

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "type": "chat",
                "channel": "streamer",
                "user": "viewer",
                "message": "hello",
                "broadcaster": false,
                "moderator": true
            })
        );
    }

    #[test]
    fn test_giveaway_events_wire_format() {
        let entry = UiEvent::GiveawayEntry {
            user_name: "Bob".to_string(),
            entrants: 2,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({
                "type": "giveaway_entry",
                "user_name": "Bob",
                "entrants": 2
            })
        );

        let draw = UiEvent::GiveawayDraw {
            entrants: vec!["Alice".to_string(), "Bob".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&draw).unwrap(),
            serde_json::json!({
                "type": "giveaway_draw",
                "entrants": ["Alice", "Bob"]
            })
        );
    }
}
