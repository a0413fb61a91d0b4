use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One student's attendance in one session. The composite primary key allows
/// at most one record per (session, student).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,

    pub status: RecordStatus,
    pub marked_at: DateTime<Utc>,
    pub marked_by: MarkedBy,
    pub excuse_reason: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RecordStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_marked_by")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MarkedBy {
    #[sea_orm(string_value = "qr")]
    Qr,

    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn to_active(record: &Model) -> ActiveModel {
    ActiveModel {
        session_id: Set(record.session_id),
        student_id: Set(record.student_id),
        status: Set(record.status),
        marked_at: Set(record.marked_at),
        marked_by: Set(record.marked_by),
        excuse_reason: Set(record.excuse_reason.clone()),
        latitude: Set(record.latitude),
        longitude: Set(record.longitude),
    }
}

impl Model {
    /// Plain insert. A second record for the same student fails with a
    /// unique-constraint violation on the primary key.
    pub async fn insert(db: &DbConn, record: &Model) -> Result<Model, DbErr> {
        to_active(record).insert(db).await
    }

    /// Inserts `record`, or if the student already has one for the session,
    /// overwrites only its status (and excuse reason when one is given).
    /// `marked_at`, `marked_by` and the captured location of an existing row
    /// are left alone.
    pub async fn upsert(db: &DbConn, record: &Model) -> Result<Model, DbErr> {
        let mut update = vec![Column::Status];
        if record.excuse_reason.is_some() {
            update.push(Column::ExcuseReason);
        }

        Entity::insert(to_active(record))
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .update_columns(update)
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::find(db, record.session_id, record.student_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Attendance record not found".to_string()))
    }

    pub async fn find(
        db: &DbConn,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((session_id, student_id)).one(db).await
    }

    pub async fn for_session(db: &DbConn, session_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::MarkedAt)
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }
}
