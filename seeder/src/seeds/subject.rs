use crate::seed::Seeder;
use db::models::subject::Model;
use rand::{Rng, rngs::OsRng, seq::SliceRandom};
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashSet;

pub struct SubjectSeeder;

#[async_trait::async_trait]
impl Seeder for SubjectSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let mut rng = OsRng;
        let names = [
            "Advanced Algorithms",
            "Distributed Systems",
            "Computer Graphics",
            "Operating Systems",
            "Software Engineering",
            "Computer Networks",
        ];

        Model::create(db, "COS301", "Software Engineering").await?;

        let mut used = HashSet::from(["COS301".to_owned()]);
        while used.len() < 6 {
            let code = format!("COS{}", rng.gen_range(100..400));
            if !used.insert(code.clone()) {
                continue;
            }
            let name = names.choose(&mut rng).copied().unwrap_or("Computer Science");
            Model::create(db, &code, name).await?;
        }

        Ok(())
    }
}
