//! Attendance session core: geofencing, QR tokens, the session manager and
//! the persistence/notification seams it talks through.

pub mod attendance;
pub mod clock;
pub mod error;
pub mod geo;
pub mod notifier;
pub mod principal;
pub mod qr;
pub mod report;
pub mod store;

pub use attendance::AttendanceSessionManager;
pub use error::{AttendanceError, Result};
