//! Inputs the engine reads from its collaborators.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use gradebook_models::{AssignmentId, BulletinId, ClassId, GradeId, SubjectId, UserId};

/// One recorded grade, denormalized with the labels reports need.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GradeEntry {
    pub id: GradeId,
    pub student_id: UserId,
    pub assignment_id: AssignmentId,
    pub assignment_title: String,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub professor_id: UserId,
    /// On the 0 to 20 scale. Storage does not enforce the bound.
    pub value: f64,
    /// The subject's coefficient at read time.
    pub subject_weight: u32,
    pub recorded_at: DateTime<Utc>,
}

/// A student-role account as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Student {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: Option<ClassId>,
    pub parent_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BulletinState {
    Draft,
    Confirmed,
}

impl BulletinState {
    pub fn from_confirmed(is_confirmed: bool) -> Self {
        if is_confirmed {
            BulletinState::Confirmed
        } else {
            BulletinState::Draft
        }
    }

    /// Confirmation is one-way: confirming a confirmed bulletin is a no-op.
    #[must_use]
    pub fn confirm(self) -> Self {
        BulletinState::Confirmed
    }

    pub fn is_confirmed(self) -> bool {
        self == BulletinState::Confirmed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinRecord {
    pub id: BulletinId,
    pub class_id: ClassId,
    pub term_name: String,
    pub state: BulletinState,
    pub created_at: DateTime<Utc>,
}

/// Converts a stored `INTEGER` coefficient into a subject weight. Zero and
/// negative values contribute nothing.
pub fn weight_from_coefficient(coefficient: i32) -> u32 {
    u32::try_from(coefficient).unwrap_or(0)
}
