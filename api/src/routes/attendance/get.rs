use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use services::attendance::HistoryFilter;
use services::report::ReportFilter;
use util::state::AppState;

use super::common::{ReportQuery, ReportResponse, SessionResponse, error_response, manager};
use crate::{auth::AuthUser, response::ApiResponse};

/// GET /api/attendance/sessions/{session_id}
///
/// The session and all of its records. Session lecturer or admin only.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    match manager(&state)
        .session_details(session_id, &user.principal())
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SessionResponse::from(session),
                "Attendance session retrieved",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/attendance/report?subject_id=&group_id=&start_date=&end_date=
///
/// Per-session present/absent counts against the group roster, sessions
/// ordered by date, and the overall attendance percentage.
pub async fn generate_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReportQuery>,
) -> (StatusCode, Json<ApiResponse<ReportResponse>>) {
    let (start, end) = match query.bounds() {
        Ok(bounds) => bounds,
        Err(msg) => return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg))),
    };
    let filter = ReportFilter {
        subject_id: query.subject_id,
        group_id: query.group_id,
        start,
        end,
    };

    match manager(&state).generate_report(&user.principal(), filter).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ReportResponse::from(report),
                "Attendance report generated",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/attendance/me?subject_id=&start_date=&end_date=
///
/// The calling student's sessions, newest first, each with only their own record.
pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReportQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionResponse>>>) {
    let (start, end) = match query.bounds() {
        Ok(bounds) => bounds,
        Err(msg) => return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg))),
    };
    let filter = HistoryFilter {
        subject_id: query.subject_id,
        start,
        end,
    };

    match manager(&state)
        .student_history(&user.principal(), filter)
        .await
    {
        Ok(sessions) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                sessions.into_iter().map(SessionResponse::from).collect(),
                "Attendance history retrieved",
            )),
        ),
        Err(e) => error_response(e),
    }
}
