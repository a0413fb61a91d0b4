use crate::ws::WebSocketManager;
use axum::extract::ws::{Message, Utf8Bytes};
use serde::Serialize;
use tokio::sync::mpsc;

/// The client's socket went away before the frame could be queued.
#[derive(Debug)]
pub struct Disconnected;

pub struct WsContext {
    pub topic: String,
    pub ws: WebSocketManager,
    out_tx: mpsc::Sender<Message>,
}

impl WsContext {
    pub fn new(topic: String, ws: WebSocketManager, out_tx: mpsc::Sender<Message>) -> Self {
        Self { topic, ws, out_tx }
    }

    /// Send a single text frame to this client only.
    pub async fn reply_text(&self, text: impl Into<Utf8Bytes>) -> Result<(), Disconnected> {
        self.out_tx
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| Disconnected)
    }

    /// Send a WS-level pong to this client.
    pub async fn reply_pong(&self, payload: bytes::Bytes) -> Result<(), Disconnected> {
        self.out_tx
            .send(Message::Pong(payload))
            .await
            .map_err(|_| Disconnected)
    }

    /// Broadcast a JSON envelope on this topic.
    pub async fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        crate::ws::emit(&self.ws, &self.topic, event, payload).await;
    }
}
