use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::{sync::mpsc, time};

use super::WebSocketManager;
use super::handler_trait::WsHandler;
use super::runtime::WsContext;

pub struct WsServerOptions {
    /// Interval between WS-level pings.
    pub ws_ping_sec: u64,
    /// Answer `{"type":"ping"}` text frames with an app-level pong.
    pub enable_app_ping: bool,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ws_ping_sec: 30,
            enable_app_ping: true,
        }
    }
}

/// Pumps one client socket: forwards topic broadcasts to the client and feeds
/// parsed client frames to `handler` until either side goes away.
pub async fn serve_topic<H: WsHandler>(
    socket: WebSocket,
    manager: WebSocketManager,
    topic: String,
    user_id: Option<i64>,
    handler: Arc<H>,
    opts: WsServerOptions,
) {
    let WsServerOptions {
        ws_ping_sec,
        enable_app_ping,
    } = opts;
    let mut rx = manager.subscribe(&topic).await;
    tracing::info!(topic = %topic, user = user_id.unwrap_or(0), "WS session opened");

    let (mut sink, mut socket_rx) = socket.split();

    // Single writer task; every producer goes through `out_tx`.
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let ctx = WsContext::new(topic.clone(), manager.clone(), out_tx.clone());

    let forward_task = {
        let out_tx = out_tx.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            while let Ok(msg) = rx.recv().await {
                if out_tx.send(Message::Text(msg.into())).await.is_err() {
                    tracing::info!(topic = %topic, "Client disconnected while forwarding");
                    break;
                }
            }
        })
    };

    let ping_task = {
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            loop {
                time::sleep(std::time::Duration::from_secs(ws_ping_sec)).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    handler.on_open(&ctx).await;

    let receive_task = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            while let Some(Ok(msg)) = socket_rx.next().await {
                match msg {
                    Message::Text(text) => {
                        let raw = text.as_str();
                        if enable_app_ping && is_app_ping(raw) {
                            let _ = ctx
                                .reply_text(
                                    serde_json::json!({
                                        "event": "pong",
                                        "topic": ctx.topic,
                                        "payload": {},
                                        "ts": Utc::now().to_rfc3339(),
                                    })
                                    .to_string(),
                                )
                                .await;
                            continue;
                        }
                        match serde_json::from_str::<H::In>(raw) {
                            Ok(parsed) => handler.on_message(&ctx, parsed).await,
                            Err(e) => tracing::warn!(
                                topic = %ctx.topic,
                                "WS invalid message: {e}; raw={raw}"
                            ),
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = ctx.reply_pong(payload).await;
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        tracing::warn!(topic = %ctx.topic, "Ignoring binary frame");
                    }
                    Message::Close(_) => {
                        handler.on_close(&ctx).await;
                        break;
                    }
                }
            }
        })
    };

    // The receive loop ending means the client is gone; stop the rest.
    let _ = receive_task.await;
    forward_task.abort();
    ping_task.abort();
    drop(out_tx);
    let _ = writer_task.await;
    tracing::info!(topic = %topic, "WS session ended");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}
