pub mod axum_adapter;
pub mod handler_trait;
pub mod manager;
pub mod runtime;
pub mod serve;

pub use manager::WebSocketManager;

use chrono::Utc;
use serde::Serialize;

/// Standard event envelope sent over WebSocket topics.
#[derive(Serialize)]
pub struct EventEnvelope<'a, T> {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub event: &'a str,
    pub topic: &'a str,
    pub payload: T,
    pub ts: String,
}

/// Broadcast a JSON-serialized `EventEnvelope` on `topic`.
///
/// Returns the number of subscribers the event reached.
pub async fn emit<T: Serialize>(
    ws: &WebSocketManager,
    topic: &str,
    event: &str,
    payload: &T,
) -> usize {
    let env = EventEnvelope {
        r#type: "event",
        event,
        topic,
        payload,
        ts: Utc::now().to_rfc3339(),
    };
    match serde_json::to_string(&env) {
        Ok(json) => ws.broadcast(topic, json).await,
        Err(e) => {
            tracing::error!(topic, event, error = %e, "Failed to serialize WS event");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn emit_wraps_payload_in_envelope() {
        let ws = WebSocketManager::new();
        let mut rx = ws.subscribe("attendance:session:7").await;

        let reached = emit(
            &ws,
            "attendance:session:7",
            "attendance.marked",
            &serde_json::json!({ "student_id": 3 }),
        )
        .await;
        assert_eq!(reached, 1);

        let raw = rx.recv().await.unwrap();
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["type"], "event");
        assert_eq!(v["event"], "attendance.marked");
        assert_eq!(v["topic"], "attendance:session:7");
        assert_eq!(v["payload"]["student_id"], 3);
    }
}
