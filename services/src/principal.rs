pub use db::models::user::Role;

use crate::store::AttendanceSession;

/// The authenticated caller of a core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn student(id: i64) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn lecturer(id: i64) -> Self {
        Self::new(id, Role::Lecturer)
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Lecturers and admins may open sessions and read reports.
    pub fn can_manage_sessions(&self) -> bool {
        matches!(self.role, Role::Lecturer | Role::Admin)
    }

    /// QR issue, overrides and details: the session's own lecturer, or any admin.
    pub fn can_manage(&self, session: &AttendanceSession) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Lecturer => session.session.lecturer_id == self.id,
            Role::Student => false,
        }
    }

    pub fn can_mark(&self) -> bool {
        self.role == Role::Student
    }
}
