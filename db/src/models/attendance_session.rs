use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::filters::AttendanceSessionFilter;
use crate::models::attendance_record;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub subject_id: i64,
    pub group_id: i64,
    pub lecturer_id: i64,
    /// Scheduled instant of the class.
    pub date: DateTime<Utc>,
    /// UTC calendar day of `date`; part of the one-session-per-day unique index.
    pub session_day: NaiveDate,
    pub class_type: ClassType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub qr_token: Option<String>,
    pub qr_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_class_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClassType {
    #[default]
    #[sea_orm(string_value = "physical")]
    Physical,

    #[sea_orm(string_value = "online")]
    Online,
}

/// Fields of a session that is about to be opened.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub subject_id: i64,
    pub group_id: i64,
    pub lecturer_id: i64,
    pub date: DateTime<Utc>,
    pub class_type: ClassType,
    pub location: Option<Location>,
}

/// Geofence of a physical session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LecturerId",
        to = "super::user::Column::Id"
    )]
    Lecturer,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a new session stamped with `now`. `location` must be `Some` only
    /// for physical classes; that pairing is checked by the caller.
    pub async fn create(db: &DbConn, new: &NewSession, now: DateTime<Utc>) -> Result<Model, DbErr> {
        let location = new.location;
        let active = ActiveModel {
            subject_id: Set(new.subject_id),
            group_id: Set(new.group_id),
            lecturer_id: Set(new.lecturer_id),
            date: Set(new.date),
            session_day: Set(new.date.date_naive()),
            class_type: Set(new.class_type),
            latitude: Set(location.map(|l| l.latitude)),
            longitude: Set(location.map(|l| l.longitude)),
            radius_meters: Set(location.map(|l| l.radius_meters)),
            qr_token: Set(None),
            qr_expiry: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(db).await
    }

    /// Session for the subject + group whose `date` falls in `[day_start, day_end)`.
    pub async fn find_for_day(
        db: &DbConn,
        subject_id: i64,
        group_id: i64,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::GroupId.eq(group_id))
            .filter(Column::Date.gte(day_start))
            .filter(Column::Date.lt(day_end))
            .one(db)
            .await
    }

    pub async fn set_qr(
        db: &DbConn,
        session_id: i64,
        token: Option<String>,
        expiry: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let model = Entity::find_by_id(session_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Attendance session not found".to_string()))?;

        let mut active: ActiveModel = model.into();
        active.qr_token = Set(token);
        active.qr_expiry = Set(expiry);
        active.updated_at = Set(now);
        active.update(db).await
    }

    pub async fn filter(
        db: &DbConn,
        filter: &AttendanceSessionFilter,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find();

        if let Some(subject_id) = filter.subject_id {
            query = query.filter(Column::SubjectId.eq(subject_id));
        }
        if let Some(group_id) = filter.group_id {
            query = query.filter(Column::GroupId.eq(group_id));
        }
        if let Some(start) = filter.start {
            query = query.filter(Column::Date.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(Column::Date.lte(end));
        }
        if let Some(student_id) = filter.student_id {
            query = query
                .inner_join(attendance_record::Entity)
                .filter(attendance_record::Column::StudentId.eq(student_id))
                .distinct();
        }

        query = if filter.newest_first {
            query.order_by_desc(Column::Date).order_by_desc(Column::Id)
        } else {
            query.order_by_asc(Column::Date).order_by_asc(Column::Id)
        };

        query.all(db).await
    }

    /// Records of this session, oldest mark first.
    pub async fn records(&self, db: &DbConn) -> Result<Vec<attendance_record::Model>, DbErr> {
        attendance_record::Model::for_session(db, self.id).await
    }

    pub fn location(&self) -> Option<Location> {
        match (self.latitude, self.longitude, self.radius_meters) {
            (Some(latitude), Some(longitude), Some(radius_meters)) => Some(Location {
                latitude,
                longitude,
                radius_meters,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{group, subject, user};
    use crate::test_utils::setup_test_db;
    use chrono::{Duration, TimeZone};

    async fn open(
        db: &DbConn,
        subject_id: i64,
        group_id: i64,
        lecturer_id: i64,
        date: DateTime<Utc>,
        class_type: ClassType,
        location: Option<Location>,
    ) -> Result<Model, DbErr> {
        let new = NewSession {
            subject_id,
            group_id,
            lecturer_id,
            date,
            class_type,
            location,
        };
        Model::create(db, &new, date).await
    }

    async fn seed(db: &DbConn) -> (i64, i64, i64) {
        let lecturer = user::Model::create(db, "lect", "lect@test.com", "pw", user::Role::Lecturer)
            .await
            .unwrap();
        let subject = subject::Model::create(db, "MAT101", "Mathematics").await.unwrap();
        let group = group::Model::create(db, "Group A").await.unwrap();
        (subject.id, group.id, lecturer.id)
    }

    #[tokio::test]
    async fn create_derives_session_day_and_location() {
        let db = setup_test_db().await;
        let (subject_id, group_id, lecturer_id) = seed(&db).await;
        let date = Utc.with_ymd_and_hms(2025, 11, 10, 23, 30, 0).unwrap();
        let loc = Location {
            latitude: -1.2864,
            longitude: 36.8172,
            radius_meters: 100.0,
        };

        let s = open(&db, subject_id, group_id, lecturer_id, date, ClassType::Physical, Some(loc))
            .await
            .unwrap();

        assert_eq!(s.session_day, NaiveDate::from_ymd_opt(2025, 11, 10).unwrap());
        assert_eq!(s.location(), Some(loc));
        assert!(s.qr_token.is_none());
    }

    #[tokio::test]
    async fn second_session_on_same_day_violates_unique_index() {
        let db = setup_test_db().await;
        let (subject_id, group_id, lecturer_id) = seed(&db).await;
        let morning = Utc.with_ymd_and_hms(2025, 11, 10, 8, 0, 0).unwrap();

        open(&db, subject_id, group_id, lecturer_id, morning, ClassType::Online, None)
            .await
            .unwrap();
        let err = open(
            &db,
            subject_id,
            group_id,
            lecturer_id,
            morning + Duration::hours(6),
            ClassType::Online,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn find_for_day_is_half_open() {
        let db = setup_test_db().await;
        let (subject_id, group_id, lecturer_id) = seed(&db).await;
        let day = Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap();
        open(&db, subject_id, group_id, lecturer_id, day + Duration::hours(9), ClassType::Online, None)
            .await
            .unwrap();

        let hit = Model::find_for_day(&db, subject_id, group_id, day, day + Duration::days(1))
            .await
            .unwrap();
        assert!(hit.is_some());

        let next = day + Duration::days(1);
        let miss = Model::find_for_day(&db, subject_id, group_id, next, next + Duration::days(1))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn filter_orders_by_date_and_applies_bounds() {
        let db = setup_test_db().await;
        let (subject_id, group_id, lecturer_id) = seed(&db).await;
        let base = Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap();
        for offset in [3, 1, 2] {
            open(
                &db,
                subject_id,
                group_id,
                lecturer_id,
                base + Duration::days(offset),
                ClassType::Online,
                None,
            )
            .await
            .unwrap();
        }

        let all = Model::filter(&db, &AttendanceSessionFilter::new().with_subject_id(subject_id))
            .await
            .unwrap();
        let days: Vec<_> = all.iter().map(|s| s.date).collect();
        assert_eq!(
            days,
            vec![base + Duration::days(1), base + Duration::days(2), base + Duration::days(3)]
        );

        let bounded = Model::filter(
            &db,
            &AttendanceSessionFilter::new()
                .with_start(base + Duration::days(2))
                .with_end(base + Duration::days(3))
                .newest_first(),
        )
        .await
        .unwrap();
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].date, base + Duration::days(3));
    }
}
