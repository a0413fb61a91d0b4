use chrono::{DateTime, Utc};

/// Criteria for listing attendance sessions. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct AttendanceSessionFilter {
    pub subject_id: Option<i64>,
    pub group_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Only sessions in which this student has a record.
    pub student_id: Option<i64>,
    pub newest_first: bool,
}

impl AttendanceSessionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject_id(mut self, subject_id: i64) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn with_group_id(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_student_id(mut self, student_id: i64) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }
}
