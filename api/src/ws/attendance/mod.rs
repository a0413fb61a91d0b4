use axum::{Router, middleware::from_fn_with_state, routing::get};
use util::state::AppState;

pub mod emit;
pub mod handlers;
pub mod payload;
pub mod ws_handlers;

use crate::auth::guards::{allow_attendance_group_ws, allow_attendance_session_ws};
use handlers::{attendance_group_ws_handler, attendance_session_ws_handler};

pub fn ws_attendance_routes(app_state: AppState) -> Router<AppState> {
    let sessions = Router::new()
        .route("/sessions/{session_id}", get(attendance_session_ws_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            allow_attendance_session_ws,
        ));

    let groups = Router::new()
        .route("/groups/{group_id}", get(attendance_group_ws_handler))
        .route_layer(from_fn_with_state(app_state, allow_attendance_group_ws));

    sessions.merge(groups)
}
