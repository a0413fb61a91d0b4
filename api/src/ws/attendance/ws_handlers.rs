use serde::Deserialize;
use util::ws::handler_trait::WsHandler;
use util::ws::runtime::WsContext;

/// Client frames understood on attendance topics. `{"type":"ping"}` is
/// answered by the server loop before it reaches the handler.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttendanceIncoming {
    Ping,
}

/// Attendance topics are server-push only; anything else a client sends is
/// logged and dropped by the server loop.
pub struct AttendanceWsHandler;

impl WsHandler for AttendanceWsHandler {
    type In = AttendanceIncoming;

    async fn on_message(&self, ctx: &WsContext, msg: Self::In) {
        tracing::debug!(topic = %ctx.topic, ?msg, "attendance WS message");
    }
}
