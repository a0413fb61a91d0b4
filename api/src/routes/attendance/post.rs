use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance::MarkInput;
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use super::common::{
    CreateSessionReq, MarkAttendanceReq, QrResponse, RecordResponse, SessionResponse,
    error_response, manager,
};
use crate::{auth::AuthUser, response::ApiResponse, ws::attendance::emit};

/// POST /api/attendance/sessions
///
/// Opens an attendance session for a subject and group on the UTC day of
/// `date` (default: now). Physical classes (the default) need a `location`.
///
/// ### Request Body
/// ```json
/// {
///   "subject_id": 1,
///   "group_id": 2,
///   "class_type": "physical",
///   "date": "2025-11-10T09:00:00Z",
///   "location": { "latitude": -1.2864, "longitude": 36.8172, "radius": 100 }
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the session
/// - `400 Bad Request` on invalid input or class type / location mismatch
/// - `403 Forbidden` when a lecturer names another lecturer
/// - `409 Conflict` when the subject and group already have a session that day
pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateSessionReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&e))),
        );
    }

    match manager(&state)
        .create_session(&user.principal(), body.into_input())
        .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SessionResponse::from(session),
                "Attendance session created",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/attendance/sessions/{session_id}/qr
///
/// Issues a new QR code for the session, superseding the previous one. Valid
/// for `QR_VALIDITY_MINUTES` (15 by default).
pub async fn generate_qr(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<QrResponse>>) {
    match manager(&state)
        .generate_qr(session_id, &user.principal())
        .await
    {
        Ok(issue) => {
            emit::qr_generated(state.ws(), session_id, issue.expiry).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    QrResponse::from(issue),
                    "QR code generated",
                )),
            )
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/attendance/mark
///
/// Marks the authenticated student present. The student id always comes from
/// the token.
///
/// ### Request Body
/// ```json
/// { "attendance_id": 1, "lat": -1.2864, "lon": 36.8172, "token": "..." }
/// ```
///
/// ### Responses
/// - `200 OK` with the new record
/// - `400 Bad Request` if the QR code has expired or the student is outside the geofence
/// - `404 Not Found` for an unknown session
/// - `409 Conflict` if already marked
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<MarkAttendanceReq>,
) -> (StatusCode, Json<ApiResponse<RecordResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&e))),
        );
    }

    let input = MarkInput {
        latitude: body.lat,
        longitude: body.lon,
        token: body.token,
    };

    match manager(&state)
        .mark_attendance(body.attendance_id, &user.principal(), input)
        .await
    {
        Ok(record) => {
            emit::attendance_marked(state.ws(), &record).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    RecordResponse::from(record),
                    "Attendance marked successfully",
                )),
            )
        }
        Err(e) => error_response(e),
    }
}
