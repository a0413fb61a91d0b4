pub mod m202510010001_create_users;
pub mod m202510010002_create_subjects;
pub mod m202510010003_create_groups;
pub mod m202510010004_create_attendance;
