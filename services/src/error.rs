use sea_orm::DbErr;
use thiserror::Error;

/// Every failure the attendance workflow can report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),

    #[error("Attendance session already exists for this date")]
    DuplicateSession,

    #[error("Attendance session not found")]
    NotFound,

    #[error("{0}")]
    Authorization(String),

    #[error("QR code has expired")]
    ExpiredToken,

    #[error("You are not within the required location for this class")]
    OutOfRange,

    #[error("Attendance already marked for this session")]
    DuplicateRecord,

    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

impl AttendanceError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DbErr> for AttendanceError {
    fn from(err: DbErr) -> Self {
        AttendanceError::Infrastructure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
