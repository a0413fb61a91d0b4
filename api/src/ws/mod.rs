use axum::Router;
use util::state::AppState;

pub mod attendance;
pub mod event;

use attendance::ws_attendance_routes;

/// WebSocket topics, mounted under `/ws`.
///
/// - `/ws/attendance/sessions/{session_id}` → live marks and QR rotations
/// - `/ws/attendance/groups/{group_id}` → session-opened notices for a group
pub fn ws_routes(app_state: AppState) -> Router<AppState> {
    Router::new().nest("/attendance", ws_attendance_routes(app_state))
}
