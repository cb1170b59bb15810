use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AssignmentId, SubjectId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assignment {
    pub id: AssignmentId,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: SubjectId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub subject_id: SubjectId,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAssignmentDto {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AssignmentFilterParams {
    pub subject_id: Option<SubjectId>,
}
