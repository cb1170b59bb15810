use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::{ClassId, PresenceId, UserId};

use crate::modules::classes::service::ClassService;

use super::model::{
    AttendanceFilterParams, AttendanceStatsParams, ClassAttendanceStats, MarkAttendanceDto,
    Presence, UpdateAttendanceDto,
};

const STUDENT_ROLE_REQUIRED: &str = "The attendance's student must have the student role";
const NOT_IN_CLASS: &str = "The student does not belong to this class";
const DUPLICATE_MARK: &str = "Attendance is already marked for this student on this date";

pub struct AttendanceService;

impl AttendanceService {
    /// Marks a student of `dto.class_id`. The date defaults to today.
    #[instrument(skip(db))]
    pub async fn mark_attendance(
        db: &PgPool,
        recorded_by: UserId,
        dto: MarkAttendanceDto,
    ) -> Result<Presence, AppError> {
        ClassService::get_class(db, dto.class_id).await?;

        let class_id = sqlx::query_scalar::<_, Option<ClassId>>(
            "SELECT class_id FROM users WHERE id = $1 AND role = 'student'",
        )
        .bind(dto.student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow!(STUDENT_ROLE_REQUIRED)))?;

        if class_id != Some(dto.class_id) {
            return Err(AppError::bad_request(anyhow!(NOT_IN_CLASS)));
        }

        let presence = sqlx::query_as::<_, Presence>(
            r#"INSERT INTO presences (student_id, class_id, date, status, recorded_by)
               VALUES ($1, $2, COALESCE($3::DATE, CURRENT_DATE), $4, $5)
               RETURNING id, student_id, class_id, date, status, recorded_by, created_at,
                         updated_at"#,
        )
        .bind(dto.student_id)
        .bind(dto.class_id)
        .bind(dto.date)
        .bind(dto.status)
        .bind(recorded_by)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_MARK))?;

        Ok(presence)
    }

    #[instrument(skip(db))]
    pub async fn get_attendance(
        db: &PgPool,
        filters: AttendanceFilterParams,
        pagination: PaginationParams,
    ) -> Result<Paginated<Presence>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM presences
               WHERE ($1::UUID IS NULL OR class_id = $1)
                 AND ($2::UUID IS NULL OR student_id = $2)
                 AND ($3::DATE IS NULL OR date = $3)
                 AND ($4::TEXT IS NULL OR status = $4)"#,
        )
        .bind(filters.class_id)
        .bind(filters.student_id)
        .bind(filters.date)
        .bind(filters.status)
        .fetch_one(db)
        .await?;

        let presences = sqlx::query_as::<_, Presence>(
            r#"SELECT id, student_id, class_id, date, status, recorded_by, created_at, updated_at
               FROM presences
               WHERE ($1::UUID IS NULL OR class_id = $1)
                 AND ($2::UUID IS NULL OR student_id = $2)
                 AND ($3::DATE IS NULL OR date = $3)
                 AND ($4::TEXT IS NULL OR status = $4)
               ORDER BY date DESC, id
               LIMIT $5 OFFSET $6"#,
        )
        .bind(filters.class_id)
        .bind(filters.student_id)
        .bind(filters.date)
        .bind(filters.status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: presences,
            meta: pagination.meta(total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_presence(db: &PgPool, id: PresenceId) -> Result<Presence, AppError> {
        sqlx::query_as::<_, Presence>(
            r#"SELECT id, student_id, class_id, date, status, recorded_by, created_at, updated_at
               FROM presences
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Attendance record not found")))
    }

    /// Every mark of one student, newest first.
    #[instrument(skip(db))]
    pub async fn get_student_attendance(
        db: &PgPool,
        student_id: UserId,
    ) -> Result<Vec<Presence>, AppError> {
        let presences = sqlx::query_as::<_, Presence>(
            r#"SELECT id, student_id, class_id, date, status, recorded_by, created_at, updated_at
               FROM presences
               WHERE student_id = $1
               ORDER BY date DESC, id"#,
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(presences)
    }

    #[instrument(skip(db))]
    pub async fn update_presence(
        db: &PgPool,
        id: PresenceId,
        dto: UpdateAttendanceDto,
    ) -> Result<Presence, AppError> {
        sqlx::query_as::<_, Presence>(
            r#"UPDATE presences
               SET status = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, student_id, class_id, date, status, recorded_by, created_at,
                         updated_at"#,
        )
        .bind(id)
        .bind(dto.status)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Attendance record not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_presence(db: &PgPool, id: PresenceId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM presences WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Attendance record not found")));
        }
        Ok(())
    }

    /// Mark counts per class within the optional date bounds. Classes without
    /// marks are listed with zero counts.
    #[instrument(skip(db))]
    pub async fn class_stats(
        db: &PgPool,
        params: AttendanceStatsParams,
    ) -> Result<Vec<ClassAttendanceStats>, AppError> {
        if let (Some(from), Some(to)) = (params.from, params.to) {
            if from > to {
                return Err(AppError::bad_request(anyhow!(
                    "from must not be after to"
                )));
            }
        }

        let stats = sqlx::query_as::<_, ClassAttendanceStats>(
            r#"SELECT c.id AS class_id, c.name AS class_name,
                      COUNT(p.id) AS total,
                      COUNT(p.id) FILTER (WHERE p.status = 'present') AS present,
                      COUNT(p.id) FILTER (WHERE p.status = 'absent') AS absent,
                      COUNT(p.id) FILTER (WHERE p.status = 'late') AS late
               FROM classes c
               LEFT JOIN presences p ON p.class_id = c.id
                    AND ($1::DATE IS NULL OR p.date >= $1)
                    AND ($2::DATE IS NULL OR p.date <= $2)
               GROUP BY c.id
               ORDER BY c.name"#,
        )
        .bind(params.from)
        .bind(params.to)
        .fetch_all(db)
        .await?;

        Ok(stats)
    }
}
