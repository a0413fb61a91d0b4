//! Persistence seam for attendance sessions and the roster.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::filters::AttendanceSessionFilter;
use db::models::user::{self, Role};
use db::models::{attendance_record, attendance_session, group_member};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde::Serialize;

use crate::attendance::HistoryFilter;
use crate::error::{AttendanceError, Result};
use crate::report::ReportFilter;

pub use db::models::attendance_record::{MarkedBy, Model as AttendanceRecord, RecordStatus};
pub use db::models::attendance_session::{ClassType, Location, NewSession};

/// A session together with its records, ordered by mark time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSession {
    #[serde(flatten)]
    pub session: attendance_session::Model,
    pub records: Vec<AttendanceRecord>,
}

impl AttendanceSession {
    pub fn id(&self) -> i64 {
        self.session.id
    }

    pub fn location(&self) -> Option<Location> {
        self.session.location()
    }

    pub fn record_for(&self, student_id: i64) -> Option<&AttendanceRecord> {
        self.records.iter().find(|r| r.student_id == student_id)
    }

    pub fn present_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == RecordStatus::Present)
            .count()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Session for the subject + group with `date` in `[day_start, day_end)`.
    async fn find_by_key(
        &self,
        subject_id: i64,
        group_id: i64,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<Option<AttendanceSession>>;

    /// Inserts a session stamped with `now`. Fails with `DuplicateSession`
    /// when the day is already taken.
    async fn create(&self, new: NewSession, now: DateTime<Utc>) -> Result<AttendanceSession>;

    async fn find_by_id(&self, id: i64) -> Result<Option<AttendanceSession>>;

    /// Persists the header fields that change after creation: QR token, expiry
    /// and `updated_at`.
    async fn save(&self, session: &AttendanceSession) -> Result<()>;

    /// Insert-if-absent. Fails with `DuplicateRecord` on conflict.
    async fn insert_record(&self, record: &AttendanceRecord) -> Result<AttendanceRecord>;

    /// Atomic manual-override upsert keyed by (session, student).
    async fn upsert_record(&self, record: &AttendanceRecord) -> Result<AttendanceRecord>;

    /// Sessions matching `filter`, oldest first.
    async fn find_matching(&self, filter: &ReportFilter) -> Result<Vec<AttendanceSession>>;

    /// Sessions where `student_id` has a record, newest first, each carrying only that record.
    async fn find_for_student(
        &self,
        student_id: i64,
        filter: &HistoryFilter,
    ) -> Result<Vec<AttendanceSession>>;
}

#[async_trait]
pub trait Roster: Send + Sync {
    async fn size_of(&self, group_id: i64) -> Result<u64>;

    /// Role of the user, `None` when no such user exists.
    async fn role_of(&self, user_id: i64) -> Result<Option<Role>>;
}

/// sea-orm backed implementation of [`SessionStore`] and [`Roster`].
#[derive(Clone)]
pub struct DbSessionStore {
    db: DatabaseConnection,
}

impl DbSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, session: attendance_session::Model) -> Result<AttendanceSession> {
        let records = session.records(&self.db).await?;
        Ok(AttendanceSession { session, records })
    }

    async fn load_all(
        &self,
        sessions: Vec<attendance_session::Model>,
    ) -> Result<Vec<AttendanceSession>> {
        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions {
            out.push(self.load(session).await?);
        }
        Ok(out)
    }
}

/// Translates constraint violations into domain errors; everything else is infrastructure.
fn map_write_err(err: DbErr, on_unique: AttendanceError) -> AttendanceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => on_unique,
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            tracing::debug!(%detail, "foreign key violation");
            AttendanceError::Validation("Referenced subject, group or user does not exist".into())
        }
        _ => match err {
            DbErr::RecordNotFound(_) => AttendanceError::NotFound,
            other => AttendanceError::from(other),
        },
    }
}

#[async_trait]
impl SessionStore for DbSessionStore {
    async fn find_by_key(
        &self,
        subject_id: i64,
        group_id: i64,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<Option<AttendanceSession>> {
        match attendance_session::Model::find_for_day(&self.db, subject_id, group_id, day_start, day_end)
            .await?
        {
            Some(session) => Ok(Some(self.load(session).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, new: NewSession, now: DateTime<Utc>) -> Result<AttendanceSession> {
        let session = attendance_session::Model::create(&self.db, &new, now)
            .await
            .map_err(|e| map_write_err(e, AttendanceError::DuplicateSession))?;

        Ok(AttendanceSession {
            session,
            records: Vec::new(),
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AttendanceSession>> {
        use sea_orm::EntityTrait;

        match attendance_session::Entity::find_by_id(id).one(&self.db).await? {
            Some(session) => Ok(Some(self.load(session).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &AttendanceSession) -> Result<()> {
        attendance_session::Model::set_qr(
            &self.db,
            session.id(),
            session.session.qr_token.clone(),
            session.session.qr_expiry,
            session.session.updated_at,
        )
        .await
        .map_err(|e| map_write_err(e, AttendanceError::DuplicateSession))?;
        Ok(())
    }

    async fn insert_record(&self, record: &AttendanceRecord) -> Result<AttendanceRecord> {
        attendance_record::Model::insert(&self.db, record)
            .await
            .map_err(|e| map_write_err(e, AttendanceError::DuplicateRecord))
    }

    async fn upsert_record(&self, record: &AttendanceRecord) -> Result<AttendanceRecord> {
        attendance_record::Model::upsert(&self.db, record)
            .await
            .map_err(|e| map_write_err(e, AttendanceError::DuplicateRecord))
    }

    async fn find_matching(&self, filter: &ReportFilter) -> Result<Vec<AttendanceSession>> {
        let mut query = AttendanceSessionFilter::new();
        if let Some(subject_id) = filter.subject_id {
            query = query.with_subject_id(subject_id);
        }
        if let Some(group_id) = filter.group_id {
            query = query.with_group_id(group_id);
        }
        if let Some(start) = filter.start {
            query = query.with_start(start);
        }
        if let Some(end) = filter.end {
            query = query.with_end(end);
        }

        let sessions = attendance_session::Model::filter(&self.db, &query).await?;
        self.load_all(sessions).await
    }

    async fn find_for_student(
        &self,
        student_id: i64,
        filter: &HistoryFilter,
    ) -> Result<Vec<AttendanceSession>> {
        let mut query = AttendanceSessionFilter::new()
            .with_student_id(student_id)
            .newest_first();
        if let Some(subject_id) = filter.subject_id {
            query = query.with_subject_id(subject_id);
        }
        if let Some(start) = filter.start {
            query = query.with_start(start);
        }
        if let Some(end) = filter.end {
            query = query.with_end(end);
        }

        let sessions = attendance_session::Model::filter(&self.db, &query).await?;
        let mut out = self.load_all(sessions).await?;
        for s in &mut out {
            s.records.retain(|r| r.student_id == student_id);
        }
        Ok(out)
    }
}

#[async_trait]
impl Roster for DbSessionStore {
    async fn size_of(&self, group_id: i64) -> Result<u64> {
        Ok(group_member::Model::count_for_group(&self.db, group_id).await?)
    }

    async fn role_of(&self, user_id: i64) -> Result<Option<Role>> {
        use sea_orm::EntityTrait;

        let found = user::Entity::find_by_id(user_id).one(&self.db).await?;
        Ok(found.map(|u| u.role))
    }
}
