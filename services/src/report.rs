use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{AttendanceRecord, AttendanceSession, ClassType};

/// Report query. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportFilter {
    pub subject_id: Option<i64>,
    pub group_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: i64,
    pub date: DateTime<Utc>,
    pub subject_id: i64,
    pub group_id: i64,
    pub class_type: ClassType,
    pub total_students: u64,
    pub present_count: u64,
    /// `total_students - present_count`; negative when the roster is stale.
    pub absent_count: i64,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub total_sessions: usize,
    pub overall_attendance: f64,
    pub sessions: Vec<SessionSummary>,
}

impl SessionSummary {
    pub fn new(session: AttendanceSession, total_students: u64) -> Self {
        let present_count = session.present_count() as u64;
        let absent_count = total_students as i64 - present_count as i64;
        if absent_count < 0 {
            tracing::warn!(
                session_id = session.id(),
                total_students,
                present_count,
                "more students present than on the roster"
            );
        }

        let AttendanceSession { session, records } = session;
        Self {
            session_id: session.id,
            date: session.date,
            subject_id: session.subject_id,
            group_id: session.group_id,
            class_type: session.class_type,
            total_students,
            present_count,
            absent_count,
            records,
        }
    }
}

impl AttendanceReport {
    pub fn from_summaries(sessions: Vec<SessionSummary>) -> Self {
        let possible: u64 = sessions.iter().map(|s| s.total_students).sum();
        let present: u64 = sessions.iter().map(|s| s.present_count).sum();
        let overall_attendance = if possible == 0 {
            0.0
        } else {
            present as f64 / possible as f64 * 100.0
        };

        Self {
            total_sessions: sessions.len(),
            overall_attendance,
            sessions,
        }
    }
}
