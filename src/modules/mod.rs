pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod bulletins;
pub mod classes;
pub mod grades;
pub mod subjects;
pub mod users;
