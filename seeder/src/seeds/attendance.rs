use crate::seed::Seeder;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use db::models::{
    attendance_record::{self, MarkedBy, RecordStatus},
    attendance_session::{self, ClassType, Location},
    group, group_member, subject,
    user::{self, Role},
};
use rand::{Rng, rngs::OsRng};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

pub struct AttendanceSeeder;

/// Sessions per subject/group pair, one per past weekday.
const PAST_DAYS: usize = 5;

/// The `count` most recent weekdays strictly before `from`, newest first.
fn past_weekdays(from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
    (1..)
        .map(|back| from - Duration::days(back))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

#[async_trait::async_trait]
impl Seeder for AttendanceSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let mut rng = OsRng;
        let now = Utc::now();

        let Some(lecturer) = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Lecturer))
            .order_by_asc(user::Column::Id)
            .one(db)
            .await?
        else {
            return Ok(());
        };
        let subjects = subject::Entity::find().all(db).await?;
        let groups = group::Entity::find().all(db).await?;

        let venue = Location {
            latitude: -25.7545,
            longitude: 28.2314,
            radius_meters: 100.0,
        };

        for (subject, group) in subjects.iter().zip(groups.iter().cycle()).take(groups.len()) {
            let members = group_member::Entity::find()
                .filter(group_member::Column::GroupId.eq(group.id))
                .all(db)
                .await?;

            for (i, date) in past_weekdays(now, PAST_DAYS).into_iter().enumerate() {
                let class_type = if i % 2 == 1 {
                    ClassType::Online
                } else {
                    ClassType::Physical
                };
                let location = (class_type == ClassType::Physical).then_some(venue);

                let new = attendance_session::NewSession {
                    subject_id: subject.id,
                    group_id: group.id,
                    lecturer_id: lecturer.id,
                    date,
                    class_type,
                    location,
                };
                let session = attendance_session::Model::create(db, &new, now).await?;

                for member in &members {
                    let roll: f64 = rng.r#gen();
                    let (status, marked_by) = match roll {
                        r if r < 0.75 => (RecordStatus::Present, MarkedBy::Qr),
                        r if r < 0.85 => (RecordStatus::Late, MarkedBy::Manual),
                        r if r < 0.90 => (RecordStatus::Absent, MarkedBy::Manual),
                        _ => continue,
                    };
                    let at_venue = marked_by == MarkedBy::Qr && class_type == ClassType::Physical;
                    attendance_record::Model::insert(
                        db,
                        &attendance_record::Model {
                            session_id: session.id,
                            student_id: member.student_id,
                            status,
                            marked_at: date + Duration::minutes(rng.gen_range(0..20)),
                            marked_by,
                            excuse_reason: (status == RecordStatus::Late)
                                .then(|| "Transport delay".to_owned()),
                            latitude: at_venue.then_some(venue.latitude),
                            longitude: at_venue.then_some(venue.longitude),
                        },
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }
}
