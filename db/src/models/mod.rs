pub mod attendance_record;
pub mod attendance_session;
pub mod group;
pub mod group_member;
pub mod subject;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use group::Entity as Group;
pub use group_member::Entity as GroupMember;
pub use subject::Entity as Subject;
pub use user::Entity as User;
