//! Recorded grades (notes), on a 0 to 20 scale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AssignmentId, GradeId, UserId};

pub const MAX_GRADE: f64 = 20.0;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: GradeId,
    pub student_id: UserId,
    pub assignment_id: AssignmentId,
    /// The professor who recorded the grade; only they may change it.
    pub professor_id: UserId,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGradeDto {
    pub student_id: UserId,
    pub assignment_id: AssignmentId,
    #[validate(range(min = 0.0, max = MAX_GRADE, message = "A grade must be between 0 and 20."))]
    pub value: f64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGradeDto {
    #[validate(range(min = 0.0, max = MAX_GRADE, message = "A grade must be between 0 and 20."))]
    pub value: f64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct GradeFilterParams {
    pub student_id: Option<UserId>,
    pub assignment_id: Option<AssignmentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(value: f64) -> CreateGradeDto {
        CreateGradeDto {
            student_id: UserId::new(),
            assignment_id: AssignmentId::new(),
            value,
        }
    }

    #[test]
    fn test_grade_bounds() {
        assert!(dto(0.0).validate().is_ok());
        assert!(dto(MAX_GRADE).validate().is_ok());
        assert!(dto(20.5).validate().is_err());
        assert!(dto(-1.0).validate().is_err());
    }

    #[test]
    fn test_grade_error_message() {
        let errors = dto(21.0).validate().unwrap_err();
        let messages: Vec<String> = errors.field_errors()["value"]
            .iter()
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect();
        assert_eq!(messages, vec!["A grade must be between 0 and 20."]);
    }
}
