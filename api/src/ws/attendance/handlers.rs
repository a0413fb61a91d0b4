use axum::{
    Extension,
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use services::notifier::{group_topic, session_topic};
use std::sync::Arc;
use util::state::AppState;
use util::ws::axum_adapter::ws_route;
use util::ws::serve::WsServerOptions;

use super::ws_handlers::AttendanceWsHandler;
use crate::auth::AuthUser;

pub async fn attendance_session_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Response {
    ws_route(
        ws,
        app_state,
        Some(claims.sub),
        session_topic(session_id),
        Arc::new(AttendanceWsHandler),
        WsServerOptions::default(),
    )
}

pub async fn attendance_group_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(group_id): Path<i64>,
) -> Response {
    ws_route(
        ws,
        app_state,
        Some(claims.sub),
        group_topic(group_id),
        Arc::new(AttendanceWsHandler),
        WsServerOptions::default(),
    )
}
