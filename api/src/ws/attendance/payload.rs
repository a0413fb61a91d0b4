use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct QrGenerated {
    pub session_id: i64,
    /// Epoch milliseconds. The token itself is never broadcast.
    pub expiry: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceMarked {
    pub session_id: i64,
    pub student_id: i64,
    pub status: String,
    pub marked_at: String, // RFC3339
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordUpdated {
    pub session_id: i64,
    pub student_id: i64,
    pub status: String,
    pub marked_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excuse_reason: Option<String>,
}
