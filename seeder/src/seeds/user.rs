use crate::seed::Seeder;
use db::models::user::{Model, Role};
use fake::{Fake, faker::internet::en::Username};
use sea_orm::{DatabaseConnection, DbErr};

pub struct UserSeeder;

pub const STUDENT_COUNT: usize = 24;

#[async_trait::async_trait]
impl Seeder for UserSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        // Fixed accounts
        Model::create(db, "admin", "admin@example.com", "password123", Role::Admin).await?;
        Model::create(db, "lecturer", "lecturer@example.com", "password123", Role::Lecturer).await?;
        Model::create(db, "lecturer2", "lecturer2@example.com", "password123", Role::Lecturer).await?;
        Model::create(db, "student", "student@example.com", "password123", Role::Student).await?;

        // Random students; the index keeps usernames unique
        for i in 0..STUDENT_COUNT {
            let handle: String = Username().fake();
            let username = format!("{handle}{i}");
            let email = format!("{username}@example.com");
            Model::create(db, &username, &email, "password123", Role::Student).await?;
        }

        Ok(())
    }
}
