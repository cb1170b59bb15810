//! Bulletins: per-class, per-term report cards. A bulletin is created as a
//! draft and must be confirmed before it can be downloaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{BulletinId, ClassId};

pub const DEFAULT_TERM_NAME: &str = "Semestre 1";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bulletin {
    pub id: BulletinId,
    pub class_id: ClassId,
    pub class_name: String,
    pub term_name: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBulletinDto {
    pub class_id: ClassId,
    /// Defaults to "Semestre 1".
    #[validate(length(min = 1, max = 100, message = "term_name must be 1 to 100 characters"))]
    pub term_name: Option<String>,
}

/// Confirmation is not part of the update; see the confirm endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBulletinDto {
    pub class_id: Option<ClassId>,
    #[validate(length(min = 1, max = 100, message = "term_name must be 1 to 100 characters"))]
    pub term_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BulletinFilterParams {
    pub class_id: Option<ClassId>,
    pub is_confirmed: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmBulletinResponse {
    pub message: String,
    pub bulletin: Bulletin,
}
