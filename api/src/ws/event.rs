use serde::Serialize;
use util::ws::{WebSocketManager, emit as emit_enveloped};

/// An event knows its stable name and the topic it belongs to.
pub trait Event: Serialize {
    const NAME: &'static str;
    fn topic_path(&self) -> String;
}

/// Wraps `ev` in the standard envelope and broadcasts it on its own topic.
pub async fn emit<E: Event>(ws: &WebSocketManager, ev: &E) -> usize {
    let topic = ev.topic_path();
    emit_enveloped(ws, &topic, E::NAME, ev).await
}
