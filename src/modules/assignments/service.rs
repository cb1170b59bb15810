use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::AssignmentId;

use crate::modules::subjects::service::SubjectService;

use super::model::{
    Assignment, AssignmentFilterParams, CreateAssignmentDto, UpdateAssignmentDto,
};

pub struct AssignmentService;

impl AssignmentService {
    #[instrument(skip(db))]
    pub async fn create_assignment(
        db: &PgPool,
        dto: CreateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        SubjectService::get_subject(db, dto.subject_id).await?;

        let assignment = sqlx::query_as::<_, Assignment>(
            r#"INSERT INTO assignments (title, description, subject_id)
               VALUES ($1, $2, $3)
               RETURNING id, title, description, subject_id, created_at"#,
        )
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.subject_id)
        .fetch_one(db)
        .await?;

        Ok(assignment)
    }

    #[instrument(skip(db))]
    pub async fn get_assignments(
        db: &PgPool,
        filters: AssignmentFilterParams,
        pagination: PaginationParams,
    ) -> Result<Paginated<Assignment>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM assignments WHERE ($1::UUID IS NULL OR subject_id = $1)",
        )
        .bind(filters.subject_id)
        .fetch_one(db)
        .await?;

        let assignments = sqlx::query_as::<_, Assignment>(
            r#"SELECT id, title, description, subject_id, created_at
               FROM assignments
               WHERE ($1::UUID IS NULL OR subject_id = $1)
               ORDER BY created_at DESC, id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(filters.subject_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: assignments,
            meta: pagination.meta(total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_assignment(db: &PgPool, id: AssignmentId) -> Result<Assignment, AppError> {
        sqlx::query_as::<_, Assignment>(
            r#"SELECT id, title, description, subject_id, created_at
               FROM assignments
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Assignment not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_assignment(
        db: &PgPool,
        id: AssignmentId,
        dto: UpdateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        let existing = Self::get_assignment(db, id).await?;

        let assignment = sqlx::query_as::<_, Assignment>(
            r#"UPDATE assignments
               SET title = $2, description = $3
               WHERE id = $1
               RETURNING id, title, description, subject_id, created_at"#,
        )
        .bind(id)
        .bind(dto.title.unwrap_or(existing.title))
        .bind(dto.description.or(existing.description))
        .fetch_one(db)
        .await?;

        Ok(assignment)
    }

    #[instrument(skip(db))]
    pub async fn delete_assignment(db: &PgPool, id: AssignmentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Assignment not found")));
        }
        Ok(())
    }
}
