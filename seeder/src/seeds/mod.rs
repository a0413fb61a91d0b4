pub mod attendance;
pub mod group;
pub mod subject;
pub mod user;
