use crate::seed::Seeder;
use db::models::{
    group, group_member,
    user::{self, Role},
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

pub struct GroupSeeder;

const GROUPS: [&str; 3] = ["Group A", "Group B", "Group C"];

#[async_trait::async_trait]
impl Seeder for GroupSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let mut groups = Vec::with_capacity(GROUPS.len());
        for name in GROUPS {
            groups.push(group::Model::create(db, name).await?);
        }

        let students = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Student))
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;

        // Round-robin so every group gets a roster
        for (i, student) in students.iter().enumerate() {
            let g = &groups[i % groups.len()];
            group_member::Model::add(db, g.id, student.id).await?;
        }

        Ok(())
    }
}
