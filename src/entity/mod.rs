//! SeaORM entity definitions.

pub mod class;
pub mod exam;
pub mod grade;
pub mod notification;
pub mod student;
pub mod subject;
pub mod teacher;
pub mod teacher_class;
pub mod teacher_subject;
pub mod user;
