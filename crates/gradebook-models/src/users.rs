//! Account models.
//!
//! A single `users` table holds every role. Students may belong to one class
//! and may be linked to one parent account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use gradebook_core::Role;

use crate::ids::{ClassId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub class_id: Option<ClassId>,
    pub parent_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 3, max = 150, message = "username must be 3 to 150 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "first_name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1 to 100 characters"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
    /// Only meaningful for students.
    pub class_id: Option<ClassId>,
    /// Only meaningful for students; must reference a parent account.
    pub parent_id: Option<UserId>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1 to 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1 to 100 characters"))]
    pub last_name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub class_id: Option<ClassId>,
    pub parent_id: Option<UserId>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleDto {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserFilterParams {
    pub role: Option<Role>,
    pub class_id: Option<ClassId>,
}

/// Students of one class, as listed for a professor teaching it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassStudents {
    pub class_id: ClassId,
    pub class_name: String,
    pub students: Vec<User>,
}
