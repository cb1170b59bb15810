//! # Gradebook Models
//!
//! Database rows, request DTOs and response shapes shared by the HTTP layer,
//! the database adapter and the CLI.
//!
//! - [`ids`]: Strongly-typed entity IDs
//! - [`users`]: Accounts of every role
//! - [`classes`], [`subjects`], [`assignments`], [`grades`]: The gradebook
//! - [`bulletins`]: Term report cards
//! - [`attendance`]: Daily presence marks
//! - [`auth`]: Login request/response

pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod bulletins;
pub mod classes;
pub mod grades;
pub mod ids;
pub mod subjects;
pub mod users;

pub use ids::{AssignmentId, BulletinId, ClassId, GradeId, PresenceId, SubjectId, UserId};
