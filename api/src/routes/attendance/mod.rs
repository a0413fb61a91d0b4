use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

pub mod common;
mod get;
mod post;
mod put;

pub use get::{generate_report, get_session, my_attendance};
pub use post::{create_session, generate_qr, mark_attendance};
pub use put::update_record;

use crate::auth::guards::{allow_lecturer_or_admin, allow_student};

/// Routes under `/api/attendance`.
///
/// - `POST /sessions` → open a session (lecturer/admin)
/// - `GET  /sessions/{session_id}` → session with records (session lecturer/admin)
/// - `POST /sessions/{session_id}/qr` → issue a QR code (session lecturer/admin)
/// - `PUT  /sessions/{session_id}/records/{student_id}` → manual override (session lecturer/admin)
/// - `GET  /report` → aggregated report (lecturer/admin)
/// - `POST /mark` → mark self present (student)
/// - `GET  /me` → own history (student)
pub fn attendance_routes() -> Router<AppState> {
    let staff = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}/qr", post(generate_qr))
        .route(
            "/sessions/{session_id}/records/{student_id}",
            put(update_record),
        )
        .route("/report", get(generate_report))
        .route_layer(from_fn(allow_lecturer_or_admin));

    let students = Router::new()
        .route("/mark", post(mark_attendance))
        .route("/me", get(my_attendance))
        .route_layer(from_fn(allow_student));

    staff.merge(students)
}
