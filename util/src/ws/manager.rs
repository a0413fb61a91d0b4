//! Topic-based broadcast hub backing the `/ws` endpoints.
//!
//! Each topic owns a Tokio broadcast channel that is created on first
//! subscription and dropped once a send finds no receivers left.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

type Sender = broadcast::Sender<String>;
type Receiver = broadcast::Receiver<String>;

/// Per-topic channel capacity. Slow receivers lag rather than block senders.
const TOPIC_CAPACITY: usize = 100;

/// Manages broadcast channels per topic for real-time attendance events.
#[derive(Clone, Default)]
pub struct WebSocketManager {
    inner: Arc<RwLock<HashMap<String, Sender>>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the given topic, creating it if necessary.
    pub async fn subscribe(&self, topic: &str) -> Receiver {
        let mut map = self.inner.write().await;
        map.entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Broadcasts a message to all subscribers of `topic` and returns how many
    /// receivers it reached.
    ///
    /// Unknown topics are a no-op. A topic left without receivers is removed.
    pub async fn broadcast<T: Into<String>>(&self, topic: &str, msg: T) -> usize {
        let mut map = self.inner.write().await;
        let Some(sender) = map.get(topic) else {
            return 0;
        };
        let delivered = sender.send(msg.into()).unwrap_or(0);
        if sender.receiver_count() == 0 {
            tracing::debug!(topic, "Removing topic with no subscribers");
            map.remove(topic);
        }
        delivered
    }

    /// Number of live receivers on `topic` (0 when the topic does not exist).
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .read()
            .await
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}
