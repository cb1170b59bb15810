use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams, Role, StudentScope};
use gradebook_models::{GradeId, UserId};

use crate::modules::assignments::service::AssignmentService;
use crate::modules::users::service::UserService;

use super::model::{CreateGradeDto, Grade, GradeFilterParams, UpdateGradeDto};

const STUDENT_ROLE_REQUIRED: &str = "The grade's student must have the student role";
const DUPLICATE_GRADE: &str = "A grade already exists for this student and assignment";

pub struct GradeService;

impl GradeService {
    /// Records a grade authored by `professor_id`.
    #[instrument(skip(db))]
    pub async fn create_grade(
        db: &PgPool,
        professor_id: UserId,
        dto: CreateGradeDto,
    ) -> Result<Grade, AppError> {
        UserService::ensure_role(db, dto.student_id, Role::Student, STUDENT_ROLE_REQUIRED).await?;
        AssignmentService::get_assignment(db, dto.assignment_id).await?;

        let grade = sqlx::query_as::<_, Grade>(
            r#"INSERT INTO grades (student_id, assignment_id, professor_id, value)
               VALUES ($1, $2, $3, $4)
               RETURNING id, student_id, assignment_id, professor_id, value, recorded_at,
                         updated_at"#,
        )
        .bind(dto.student_id)
        .bind(dto.assignment_id)
        .bind(professor_id)
        .bind(dto.value)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_GRADE))?;

        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn get_grades(
        db: &PgPool,
        filters: GradeFilterParams,
        pagination: PaginationParams,
    ) -> Result<Paginated<Grade>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM grades
               WHERE ($1::UUID IS NULL OR student_id = $1)
                 AND ($2::UUID IS NULL OR assignment_id = $2)"#,
        )
        .bind(filters.student_id)
        .bind(filters.assignment_id)
        .fetch_one(db)
        .await?;

        let grades = sqlx::query_as::<_, Grade>(
            r#"SELECT id, student_id, assignment_id, professor_id, value, recorded_at, updated_at
               FROM grades
               WHERE ($1::UUID IS NULL OR student_id = $1)
                 AND ($2::UUID IS NULL OR assignment_id = $2)
               ORDER BY recorded_at DESC, id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(filters.student_id)
        .bind(filters.assignment_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: grades,
            meta: pagination.meta(total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_grade(db: &PgPool, id: GradeId) -> Result<Grade, AppError> {
        sqlx::query_as::<_, Grade>(
            r#"SELECT id, student_id, assignment_id, professor_id, value, recorded_at, updated_at
               FROM grades
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Grade not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_grade(
        db: &PgPool,
        id: GradeId,
        dto: UpdateGradeDto,
    ) -> Result<Grade, AppError> {
        sqlx::query_as::<_, Grade>(
            r#"UPDATE grades
               SET value = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, student_id, assignment_id, professor_id, value, recorded_at,
                         updated_at"#,
        )
        .bind(id)
        .bind(dto.value)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Grade not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_grade(db: &PgPool, id: GradeId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Grade not found")));
        }
        Ok(())
    }

    /// The scope a student-record check is decided against. Fails with 404
    /// unless `student_id` is a student account.
    #[instrument(skip(db))]
    pub async fn student_scope(db: &PgPool, student_id: UserId) -> Result<StudentScope, AppError> {
        let parent_id = sqlx::query_scalar::<_, Option<UserId>>(
            "SELECT parent_id FROM users WHERE id = $1 AND role = 'student'",
        )
        .bind(student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Student not found.")))?;

        Ok(StudentScope {
            student_id: student_id.into_inner(),
            parent_id: parent_id.map(UserId::into_inner),
        })
    }
}
