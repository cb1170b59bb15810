//! Subjects (matières): a named course taught to one class, weighted by a
//! positive integer coefficient in every average.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{ClassId, SubjectId, UserId};

pub const DEFAULT_COEFFICIENT: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub class_id: ClassId,
    pub professor_id: Option<UserId>,
    pub coefficient: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A subject joined with its class name and professor's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubjectDetails {
    pub id: SubjectId,
    pub name: String,
    pub class_id: ClassId,
    pub class_name: String,
    pub professor_id: Option<UserId>,
    pub professor_name: Option<String>,
    pub coefficient: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectDto {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    pub class_id: ClassId,
    /// Must reference a professor account.
    pub professor_id: Option<UserId>,
    /// Defaults to 1.
    #[validate(range(min = 1, message = "coefficient must be a positive integer"))]
    pub coefficient: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectDto {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: Option<String>,
    pub class_id: Option<ClassId>,
    pub professor_id: Option<UserId>,
    #[validate(range(min = 1, message = "coefficient must be a positive integer"))]
    pub coefficient: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SubjectFilterParams {
    pub class_id: Option<ClassId>,
    pub professor_id: Option<UserId>,
}
