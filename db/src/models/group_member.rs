use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryFilter, Set};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn add(db: &DbConn, group_id: i64, student_id: i64) -> Result<Model, DbErr> {
        ActiveModel {
            group_id: Set(group_id),
            student_id: Set(student_id),
            joined_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    /// Number of students currently enrolled in the group.
    pub async fn count_for_group(db: &DbConn, group_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::GroupId.eq(group_id))
            .count(db)
            .await
    }

    pub async fn is_member(db: &DbConn, group_id: i64, student_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((group_id, student_id))
            .one(db)
            .await?
            .is_some())
    }
}
