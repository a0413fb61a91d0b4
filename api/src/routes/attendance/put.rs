use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance::UpdateRecordInput;
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use super::common::{RecordResponse, UpdateRecordReq, error_response, manager};
use crate::{auth::AuthUser, response::ApiResponse, ws::attendance::emit};

/// PUT /api/attendance/sessions/{session_id}/records/{student_id}
///
/// Manual override. Updates the student's record in place (keeping how and
/// when it was first marked) or creates a `manual` one. No expiry or
/// geofence checks apply.
///
/// ### Request Body
/// ```json
/// { "status": "late", "excuse_reason": "Late arrival" }
/// ```
pub async fn update_record(
    State(state): State<AppState>,
    Path((session_id, student_id)): Path<(i64, i64)>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateRecordReq>,
) -> (StatusCode, Json<ApiResponse<RecordResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&e))),
        );
    }

    let input = UpdateRecordInput {
        status: body.status,
        excuse_reason: body.excuse_reason,
    };

    match manager(&state)
        .update_record(session_id, student_id, input, &user.principal())
        .await
    {
        Ok(record) => {
            emit::record_updated(state.ws(), &record).await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    RecordResponse::from(record),
                    "Attendance record updated",
                )),
            )
        }
        Err(e) => error_response(e),
    }
}
