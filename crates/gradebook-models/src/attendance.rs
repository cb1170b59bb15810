//! Attendance marks (presences).
//!
//! One mark per student, class and day. Status is stored as TEXT with a
//! CHECK constraint, the same way roles are.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, FromRow, Type,
    postgres::PgTypeInfo,
};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{ClassId, PresenceId, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown attendance status '{s}'"))
    }
}

impl Type<sqlx::Postgres> for AttendanceStatus {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for AttendanceStatus {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for AttendanceStatus {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<AttendanceStatus>()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Presence {
    pub id: PresenceId,
    pub student_id: UserId,
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Who marked it; cleared if that account is deleted.
    pub recorded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceDto {
    pub student_id: UserId,
    pub class_id: ClassId,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// Defaults to `present`.
    #[serde(default)]
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAttendanceDto {
    pub status: AttendanceStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AttendanceFilterParams {
    pub class_id: Option<ClassId>,
    pub student_id: Option<UserId>,
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

/// Inclusive date bounds for statistics.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AttendanceStatsParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Mark counts for one class.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassAttendanceStats {
    pub class_id: ClassId,
    pub class_name: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        for status in AttendanceStatus::ALL {
            assert_eq!(status.as_str().parse::<AttendanceStatus>().unwrap(), status);
        }
        assert!("excused".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_mark_defaults_to_present() {
        let json = r#"{"student_id":"12345678-1234-1234-1234-123456789abc","class_id":"12345678-1234-1234-1234-123456789abd"}"#;
        let dto: MarkAttendanceDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.status, AttendanceStatus::Present);
        assert!(dto.date.is_none());
    }

    #[test]
    fn test_mark_rejects_unknown_status() {
        let json = r#"{"student_id":"12345678-1234-1234-1234-123456789abc","class_id":"12345678-1234-1234-1234-123456789abd","status":"sick"}"#;
        assert!(serde_json::from_str::<MarkAttendanceDto>(json).is_err());
    }

    #[test]
    fn test_mark_parses_date() {
        let json = r#"{"student_id":"12345678-1234-1234-1234-123456789abc","class_id":"12345678-1234-1234-1234-123456789abd","date":"2025-03-14","status":"late"}"#;
        let dto: MarkAttendanceDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(dto.status, AttendanceStatus::Late);
    }
}
