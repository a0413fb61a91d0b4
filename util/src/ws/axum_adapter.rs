use super::handler_trait::WsHandler;
use super::serve::{WsServerOptions, serve_topic};
use crate::state::AppState;
use axum::{
    extract::{WebSocketUpgrade, ws::WebSocket},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Upgrades the request and serves `topic` with `handler` on the shared manager.
pub fn ws_route<H>(
    ws: WebSocketUpgrade,
    state: AppState,
    user_id: Option<i64>,
    topic: String,
    handler: Arc<H>,
    opts: WsServerOptions,
) -> Response
where
    H: WsHandler,
{
    let manager = state.ws_clone();

    ws.on_upgrade(move |socket: WebSocket| async move {
        serve_topic(socket, manager, topic, user_id, handler, opts).await;
    })
    .into_response()
}
