//! Roles and capability checks.
//!
//! Every account holds exactly one [`Role`]. Handlers never branch on the
//! role directly; they ask [`authorize`] whether an [`Actor`] may exercise a
//! [`Capability`], optionally against a specific student ([`StudentScope`]).
//!
//! | Capability | Admin | Professor | Student | Parent |
//! |---|---|---|---|---|
//! | `ManageUsers`, `ManageClasses`, `ManageSubjects`, `ManageBulletins`, `DownloadClassBulletin`, `ViewAttendanceStats` | yes | | | |
//! | `CreateAssignments`, `MarkAttendance` | yes | yes | | |
//! | `RecordGrades`, `ViewTeachingLoad` | | yes | | |
//! | `ViewGradebook` | yes | yes | | |
//! | `ViewStudentRecord` | yes | yes | self | own child |
//! | `DownloadStudentBulletin` | yes | | self | own child |
//! | `ViewChildren` | | | | yes |
//! | `ViewOwnAttendance` | | | yes | |

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Professor,
    Student,
    Parent,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Professor, Role::Student, Role::Parent];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Professor => "professor",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

// Stored as TEXT with a CHECK constraint rather than a Postgres enum.
impl Type<sqlx::Postgres> for Role {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for Role {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<Role>()?)
    }
}

impl PgHasArrayType for Role {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageUsers,
    ManageClasses,
    ManageSubjects,
    ManageBulletins,
    CreateAssignments,
    RecordGrades,
    ViewGradebook,
    ViewStudentRecord,
    DownloadClassBulletin,
    DownloadStudentBulletin,
    ViewTeachingLoad,
    ViewChildren,
    MarkAttendance,
    ViewOwnAttendance,
    ViewAttendanceStats,
}

impl Capability {
    /// Scoped capabilities are decided per target student for the student
    /// and parent roles.
    pub const fn is_scoped(&self) -> bool {
        matches!(
            self,
            Capability::ViewStudentRecord | Capability::DownloadStudentBulletin
        )
    }

    const fn denial(&self) -> &'static str {
        match self {
            Capability::ManageUsers => "Only administrators can manage users.",
            Capability::ManageClasses => "Only administrators can manage classes.",
            Capability::ManageSubjects => "Only administrators can manage subjects.",
            Capability::ManageBulletins => "Only administrators can manage bulletins.",
            Capability::CreateAssignments => {
                "Only administrators and professors can manage assignments."
            }
            Capability::RecordGrades => "Only professors can record grades.",
            Capability::ViewGradebook => "Only administrators and professors can view grades.",
            Capability::ViewStudentRecord => "You are not allowed to view this student's record.",
            Capability::DownloadClassBulletin => {
                "Only administrators can download a class bulletin."
            }
            Capability::DownloadStudentBulletin => {
                "You are not allowed to download this student's bulletin."
            }
            Capability::ViewTeachingLoad => "Only professors can view their teaching load.",
            Capability::ViewChildren => "Only parents can view their children.",
            Capability::MarkAttendance => {
                "Only administrators and professors can mark attendance."
            }
            Capability::ViewOwnAttendance => "Only students can view their own attendance.",
            Capability::ViewAttendanceStats => {
                "Only administrators can view attendance statistics."
            }
        }
    }
}

/// The authenticated account performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

/// The student a scoped capability is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentScope {
    pub student_id: Uuid,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::forbidden(reason)),
        }
    }
}

/// Decides whether `actor` may exercise `capability`.
///
/// Scoped capabilities are denied to students and parents when no `scope` is
/// given.
pub fn authorize(actor: &Actor, capability: Capability, scope: Option<&StudentScope>) -> Decision {
    use Capability::*;
    use Role::*;

    let allowed = match (capability, actor.role) {
        (ManageUsers | ManageClasses | ManageSubjects | ManageBulletins, Admin) => true,
        (DownloadClassBulletin | ViewAttendanceStats, Admin) => true,
        (CreateAssignments | ViewGradebook | MarkAttendance, Admin | Professor) => true,
        (ViewOwnAttendance, Student) => true,
        (RecordGrades | ViewTeachingLoad, Professor) => true,
        (ViewChildren, Parent) => true,
        (ViewStudentRecord, Admin | Professor) => true,
        (DownloadStudentBulletin, Admin) => true,
        (ViewStudentRecord | DownloadStudentBulletin, Student) => {
            scope.is_some_and(|s| s.student_id == actor.user_id)
        }
        (ViewStudentRecord | DownloadStudentBulletin, Parent) => {
            scope.is_some_and(|s| s.parent_id == Some(actor.user_id))
        }
        _ => false,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny(capability.denial())
    }
}
