use axum::{Json, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use services::attendance::{LocationInput, QrIssue};
use services::report::{AttendanceReport, SessionSummary};
use services::store::{AttendanceRecord, AttendanceSession, ClassType, RecordStatus};
use services::{AttendanceError, AttendanceSessionManager};
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;

pub fn manager(state: &AppState) -> AttendanceSessionManager {
    AttendanceSessionManager::for_db(state.db_clone(), state.ws_clone())
}

/// HTTP status and client-facing message for a core error.
pub fn status_for(err: &AttendanceError) -> (StatusCode, String) {
    let status = match err {
        AttendanceError::Validation(_)
        | AttendanceError::ExpiredToken
        | AttendanceError::OutOfRange => StatusCode::BAD_REQUEST,
        AttendanceError::DuplicateSession | AttendanceError::DuplicateRecord => {
            StatusCode::CONFLICT
        }
        AttendanceError::NotFound => StatusCode::NOT_FOUND,
        AttendanceError::Authorization(_) => StatusCode::FORBIDDEN,
        AttendanceError::Infrastructure(detail) => {
            tracing::error!(%detail, "attendance request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };
    (status, err.to_string())
}

pub fn error_response<T>(err: AttendanceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let (status, msg) = status_for(&err);
    (status, Json(ApiResponse::error(msg)))
}

// ---------- requests ----------

#[derive(Debug, Deserialize, Validate)]
pub struct LocationReq {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be between -180 and 180"))]
    pub longitude: f64,
    #[validate(range(min = 10.0, max = 1000.0, message = "radius must be between 10 and 1000 meters"))]
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    #[serde(alias = "subjectId", alias = "subject")]
    pub subject_id: i64,
    #[serde(alias = "groupId", alias = "group")]
    pub group_id: i64,
    #[serde(default, alias = "lecturerId", alias = "lecturer")]
    pub lecturer_id: Option<i64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, alias = "classType")]
    pub class_type: Option<ClassType>,
    #[serde(default)]
    #[validate(nested)]
    pub location: Option<LocationReq>,
}

impl CreateSessionReq {
    pub fn into_input(self) -> services::attendance::NewSessionInput {
        services::attendance::NewSessionInput {
            subject_id: self.subject_id,
            group_id: self.group_id,
            lecturer_id: self.lecturer_id,
            date: self.date,
            class_type: self.class_type,
            location: self.location.map(|l| LocationInput {
                latitude: Some(l.latitude),
                longitude: Some(l.longitude),
                radius: l.radius,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkAttendanceReq {
    #[serde(alias = "attendanceId", alias = "session_id")]
    pub attendance_id: i64,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0, message = "lat must be between -90 and 90"))]
    pub lat: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0, message = "lon must be between -180 and 180"))]
    pub lon: Option<f64>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecordReq {
    pub status: RecordStatus,
    #[serde(default, alias = "excuseReason", alias = "notes")]
    #[validate(length(max = 500, message = "excuse_reason must be at most 500 characters"))]
    pub excuse_reason: Option<String>,
}

/// Query of `/report` and `/me`. Date bounds are inclusive and take either an
/// RFC 3339 timestamp or a plain `YYYY-MM-DD` date; a plain end date covers
/// that whole day.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default, alias = "subjectId")]
    pub subject_id: Option<i64>,
    #[serde(default, alias = "groupId")]
    pub group_id: Option<i64>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

/// Which end of an inclusive range a date-only bound stands for.
#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(field: &str, raw: &str, bound: Bound) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("{field} must be a date (YYYY-MM-DD) or an RFC 3339 timestamp"))?;
    let at = match bound {
        Bound::Start => day.and_hms_opt(0, 0, 0),
        Bound::End => day.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    at.map(|t| t.and_utc())
        .ok_or_else(|| format!("{field} is out of range"))
}

impl ReportQuery {
    /// Parsed `(start, end)` bounds.
    pub fn bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), String> {
        let start = self
            .start_date
            .as_deref()
            .map(|raw| parse_bound("start_date", raw, Bound::Start))
            .transpose()?;
        let end = self
            .end_date
            .as_deref()
            .map(|raw| parse_bound("end_date", raw, Bound::End))
            .transpose()?;
        Ok((start, end))
    }
}

// ---------- responses ----------

#[derive(Debug, Serialize, Default)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Serialize, Default)]
pub struct RecordResponse {
    pub session_id: i64,
    pub student_id: i64,
    pub status: String,
    pub marked_at: String,
    pub marked_by: String,
    pub excuse_reason: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<AttendanceRecord> for RecordResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            session_id: r.session_id,
            student_id: r.student_id,
            status: r.status.to_string(),
            marked_at: r.marked_at.to_rfc3339(),
            marked_by: r.marked_by.to_string(),
            excuse_reason: r.excuse_reason,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct SessionResponse {
    pub id: i64,
    pub subject_id: i64,
    pub group_id: i64,
    pub lecturer_id: i64,
    pub date: String,
    pub class_type: String,
    pub location: Option<LocationResponse>,
    pub qr_expiry: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub records: Vec<RecordResponse>,
}

impl From<AttendanceSession> for SessionResponse {
    fn from(s: AttendanceSession) -> Self {
        let location = s.location().map(|l| LocationResponse {
            latitude: l.latitude,
            longitude: l.longitude,
            radius_meters: l.radius_meters,
        });
        let AttendanceSession { session, records } = s;
        Self {
            id: session.id,
            subject_id: session.subject_id,
            group_id: session.group_id,
            lecturer_id: session.lecturer_id,
            date: session.date.to_rfc3339(),
            class_type: session.class_type.to_string(),
            location,
            qr_expiry: session.qr_expiry.map(|e| e.to_rfc3339()),
            created_at: session.created_at.to_rfc3339(),
            updated_at: session.updated_at.to_rfc3339(),
            records: records.into_iter().map(RecordResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct QrResponse {
    pub qr_code: String,
    pub token: String,
    /// Epoch milliseconds.
    pub expiry: i64,
    pub attendance_id: i64,
}

impl From<QrIssue> for QrResponse {
    fn from(q: QrIssue) -> Self {
        Self {
            qr_code: q.qr_code,
            token: q.token,
            expiry: q.expiry,
            attendance_id: q.attendance_id,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ReportSessionResponse {
    pub session_id: i64,
    pub date: String,
    pub subject_id: i64,
    pub group_id: i64,
    pub class_type: String,
    pub total_students: u64,
    pub present_count: u64,
    pub absent_count: i64,
    pub records: Vec<RecordResponse>,
}

impl From<SessionSummary> for ReportSessionResponse {
    fn from(s: SessionSummary) -> Self {
        Self {
            session_id: s.session_id,
            date: s.date.to_rfc3339(),
            subject_id: s.subject_id,
            group_id: s.group_id,
            class_type: s.class_type.to_string(),
            total_students: s.total_students,
            present_count: s.present_count,
            absent_count: s.absent_count,
            records: s.records.into_iter().map(RecordResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ReportResponse {
    pub total_sessions: usize,
    pub overall_attendance: f64,
    pub sessions: Vec<ReportSessionResponse>,
}

impl From<AttendanceReport> for ReportResponse {
    fn from(r: AttendanceReport) -> Self {
        Self {
            total_sessions: r.total_sessions,
            overall_attendance: r.overall_attendance,
            sessions: r.sessions.into_iter().map(ReportSessionResponse::from).collect(),
        }
    }
}
