//! Orchestrates the attendance workflow: open a session, issue QR codes,
//! accept student marks, apply lecturer overrides and aggregate reports.
//!
//! All persistence goes through [`SessionStore`]/[`Roster`] and is bounded by
//! a timeout. The "session opened" notice is sent on a detached task; its
//! outcome never affects the caller.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use util::config;
use util::ws::WebSocketManager;

use crate::clock::{Clock, SystemClock};
use crate::error::{AttendanceError, Result};
use crate::geo::{self, GeoPoint};
use crate::notifier::{Notice, Notifier, WsNotifier};
use crate::principal::{Principal, Role};
use crate::qr::{self, QrTokenIssuer};
use crate::report::{AttendanceReport, ReportFilter, SessionSummary};
use crate::store::{
    AttendanceRecord, AttendanceSession, ClassType, DbSessionStore, Location, MarkedBy,
    NewSession, RecordStatus, Roster, SessionStore,
};

pub const DEFAULT_RADIUS_METERS: f64 = 100.0;
pub const MIN_RADIUS_METERS: f64 = 10.0;
pub const MAX_RADIUS_METERS: f64 = 1000.0;

/// Geofence as submitted when opening a session. Radius defaults to 100 m.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LocationInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSessionInput {
    pub subject_id: i64,
    pub group_id: i64,
    /// Only honoured for admins; lecturers always open sessions as themselves.
    pub lecturer_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub class_type: Option<ClassType>,
    pub location: Option<LocationInput>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// The scanned token. When given it must be the session's current one.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecordInput {
    pub status: RecordStatus,
    pub excuse_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub subject_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Result of a QR issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrIssue {
    /// PNG data URL of the code.
    pub qr_code: String,
    pub token: String,
    /// Epoch milliseconds.
    pub expiry: i64,
    pub attendance_id: i64,
}

pub struct AttendanceSessionManager {
    store: Arc<dyn SessionStore>,
    roster: Arc<dyn Roster>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    issuer: QrTokenIssuer,
    store_timeout: Duration,
    notifier_timeout: Duration,
}

impl AttendanceSessionManager {
    /// Manager with timeouts and QR validity taken from configuration.
    pub fn new(
        store: Arc<dyn SessionStore>,
        roster: Arc<dyn Roster>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            roster,
            notifier,
            clock,
            issuer: QrTokenIssuer::from_config(),
            store_timeout: Duration::from_millis(config::store_timeout_ms()),
            notifier_timeout: Duration::from_millis(config::notifier_timeout_ms()),
        }
    }

    /// Production wiring: sea-orm store and roster, WebSocket notices, wall clock.
    pub fn for_db(db: DatabaseConnection, ws: WebSocketManager) -> Self {
        let store = Arc::new(DbSessionStore::new(db));
        Self::new(
            store.clone(),
            store,
            Arc::new(WsNotifier::new(ws)),
            Arc::new(SystemClock),
        )
    }

    pub fn with_issuer(mut self, issuer: QrTokenIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_notifier_timeout(mut self, timeout: Duration) -> Self {
        self.notifier_timeout = timeout;
        self
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                tracing::error!(timeout_ms = self.store_timeout.as_millis() as u64, "session store timed out");
                Err(AttendanceError::Infrastructure("session store timed out".into()))
            }
        }
    }

    async fn load(&self, session_id: i64) -> Result<AttendanceSession> {
        self.bounded(self.store.find_by_id(session_id))
            .await?
            .ok_or(AttendanceError::NotFound)
    }

    async fn load_managed(&self, session_id: i64, requester: &Principal) -> Result<AttendanceSession> {
        let session = self.load(session_id).await?;
        if !requester.can_manage(&session) {
            return Err(AttendanceError::forbidden(
                "Only the session's lecturer or an admin can manage this session",
            ));
        }
        Ok(session)
    }

    fn notify(&self, notice: Notice) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notifier_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.send(notice)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "session notice failed"),
                Err(_) => tracing::warn!("session notice timed out"),
            }
        });
    }

    /// Opens a session for a subject and group on the UTC day of `date`.
    pub async fn create_session(
        &self,
        requester: &Principal,
        input: NewSessionInput,
    ) -> Result<AttendanceSession> {
        if !requester.can_manage_sessions() {
            return Err(AttendanceError::forbidden(
                "Only lecturers can create attendance sessions",
            ));
        }

        let lecturer_id = match (requester.role, input.lecturer_id) {
            (Role::Admin, Some(id)) if id != requester.id => {
                match self.bounded(self.roster.role_of(id)).await? {
                    Some(Role::Lecturer) => id,
                    _ => return Err(AttendanceError::invalid("lecturer_id must refer to a lecturer")),
                }
            }
            (_, Some(id)) if id != requester.id => {
                return Err(AttendanceError::forbidden(
                    "Lecturers can only create sessions for themselves",
                ));
            }
            _ => requester.id,
        };

        let now = self.clock.now();
        let class_type = input.class_type.unwrap_or_default();
        let date = input.date.unwrap_or(now);
        let location = validate_location(class_type, input.location)?;

        let day_start = date
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AttendanceError::invalid("Invalid session date"))?
            .and_utc();
        let day_end = day_start + ChronoDuration::days(1);

        if self
            .bounded(self.store.find_by_key(input.subject_id, input.group_id, day_start, day_end))
            .await?
            .is_some()
        {
            return Err(AttendanceError::DuplicateSession);
        }

        let new = NewSession {
            subject_id: input.subject_id,
            group_id: input.group_id,
            lecturer_id,
            date,
            class_type,
            location,
        };
        let session = self.bounded(self.store.create(new, now)).await?;

        tracing::info!(
            session_id = session.id(),
            subject_id = input.subject_id,
            group_id = input.group_id,
            lecturer_id,
            class_type = %class_type,
            "attendance session created"
        );

        self.notify(Notice::session_opened(&session));
        Ok(session)
    }

    /// Issues a fresh QR token, superseding any previous one.
    pub async fn generate_qr(&self, session_id: i64, requester: &Principal) -> Result<QrIssue> {
        let mut session = self.load_managed(session_id, requester).await?;

        let now = self.clock.now();
        let issued = self.issuer.issue(session_id, now)?;
        let qr_code = qr::render_data_url(&issued.token)?;

        session.session.qr_token = Some(issued.token.clone());
        session.session.qr_expiry = Some(issued.expiry);
        session.session.updated_at = now;
        self.bounded(self.store.save(&session)).await?;

        tracing::info!(session_id, expiry = %issued.expiry, "QR code issued");

        Ok(QrIssue {
            qr_code,
            token: issued.token,
            expiry: issued.expiry.timestamp_millis(),
            attendance_id: session_id,
        })
    }

    /// Marks the calling student present.
    pub async fn mark_attendance(
        &self,
        session_id: i64,
        student: &Principal,
        input: MarkInput,
    ) -> Result<AttendanceRecord> {
        if !student.can_mark() {
            return Err(AttendanceError::forbidden("Only students can mark attendance"));
        }

        let session = self.load(session_id).await?;
        let now = self.clock.now();

        // No QR ever issued: nothing to expire.
        if let Some(expiry) = session.session.qr_expiry {
            if now > expiry {
                return Err(AttendanceError::ExpiredToken);
            }
        }
        if let Some(presented) = input.token.as_deref() {
            if session.session.qr_token.as_deref() != Some(presented) {
                return Err(AttendanceError::ExpiredToken);
            }
        }

        let point = GeoPoint {
            lat: input.latitude,
            lon: input.longitude,
        };
        let physical = session.session.class_type == ClassType::Physical;
        if physical {
            let inside = match session.location() {
                Some(loc) => geo::is_within_radius(
                    &point,
                    &GeoPoint::new(loc.latitude, loc.longitude),
                    loc.radius_meters / 1000.0,
                ),
                None => false,
            };
            if !inside {
                tracing::debug!(session_id, student_id = student.id, "mark outside geofence");
                return Err(AttendanceError::OutOfRange);
            }
        }

        if session.record_for(student.id).is_some() {
            return Err(AttendanceError::DuplicateRecord);
        }

        let record = AttendanceRecord {
            session_id,
            student_id: student.id,
            status: RecordStatus::Present,
            marked_at: now,
            marked_by: MarkedBy::Qr,
            excuse_reason: None,
            latitude: if physical { point.lat } else { None },
            longitude: if physical { point.lon } else { None },
        };
        let saved = self.bounded(self.store.insert_record(&record)).await?;

        tracing::info!(session_id, student_id = student.id, "attendance marked");
        Ok(saved)
    }

    /// Lecturer/admin correction of one student's record. Not subject to
    /// expiry or geofence checks.
    pub async fn update_record(
        &self,
        session_id: i64,
        student_id: i64,
        input: UpdateRecordInput,
        requester: &Principal,
    ) -> Result<AttendanceRecord> {
        let session = self.load_managed(session_id, requester).await?;

        let record = match session.record_for(student_id) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.status = input.status;
                if input.excuse_reason.is_some() {
                    merged.excuse_reason = input.excuse_reason;
                }
                merged
            }
            None => AttendanceRecord {
                session_id,
                student_id,
                status: input.status,
                marked_at: self.clock.now(),
                marked_by: MarkedBy::Manual,
                excuse_reason: input.excuse_reason,
                latitude: None,
                longitude: None,
            },
        };

        let saved = self.bounded(self.store.upsert_record(&record)).await?;
        tracing::info!(
            session_id,
            student_id,
            status = %saved.status,
            by = requester.id,
            "attendance record updated"
        );
        Ok(saved)
    }

    pub async fn generate_report(
        &self,
        requester: &Principal,
        filter: ReportFilter,
    ) -> Result<AttendanceReport> {
        if !requester.can_manage_sessions() {
            return Err(AttendanceError::forbidden(
                "Only lecturers and admins can view attendance reports",
            ));
        }

        let sessions = self.bounded(self.store.find_matching(&filter)).await?;

        let mut sizes: HashMap<i64, u64> = HashMap::new();
        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions {
            let group_id = session.session.group_id;
            let total = match sizes.get(&group_id) {
                Some(n) => *n,
                None => {
                    let n = self.bounded(self.roster.size_of(group_id)).await?;
                    sizes.insert(group_id, n);
                    n
                }
            };
            summaries.push(SessionSummary::new(session, total));
        }

        Ok(AttendanceReport::from_summaries(summaries))
    }

    /// A session with all of its records.
    pub async fn session_details(
        &self,
        session_id: i64,
        requester: &Principal,
    ) -> Result<AttendanceSession> {
        self.load_managed(session_id, requester).await
    }

    /// The calling student's own attendance, newest session first.
    pub async fn student_history(
        &self,
        student: &Principal,
        filter: HistoryFilter,
    ) -> Result<Vec<AttendanceSession>> {
        if student.role != Role::Student {
            return Err(AttendanceError::forbidden(
                "Only students have an attendance history",
            ));
        }
        self.bounded(self.store.find_for_student(student.id, &filter))
            .await
    }
}

/// Physical classes need a complete, in-range geofence; online classes must not have one.
fn validate_location(
    class_type: ClassType,
    input: Option<LocationInput>,
) -> Result<Option<Location>> {
    match (class_type, input) {
        (ClassType::Online, None) => Ok(None),
        (ClassType::Online, Some(_)) => Err(AttendanceError::invalid(
            "Online sessions must not have a location",
        )),
        (ClassType::Physical, None) => Err(AttendanceError::invalid(
            "Location is required for physical classes",
        )),
        (ClassType::Physical, Some(loc)) => {
            let (Some(latitude), Some(longitude)) = (loc.latitude, loc.longitude) else {
                return Err(AttendanceError::invalid(
                    "Location latitude and longitude are required for physical classes",
                ));
            };
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(AttendanceError::invalid("latitude must be between -90 and 90"));
            }
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(AttendanceError::invalid("longitude must be between -180 and 180"));
            }
            let radius_meters = loc.radius.unwrap_or(DEFAULT_RADIUS_METERS);
            if !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius_meters) {
                return Err(AttendanceError::invalid(
                    "radius must be between 10 and 1000 meters",
                ));
            }
            Ok(Some(Location {
                latitude,
                longitude,
                radius_meters,
            }))
        }
    }
}
