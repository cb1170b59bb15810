use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams, Role};
use gradebook_models::{SubjectId, UserId};
use gradebook_models::subjects::DEFAULT_COEFFICIENT;

use crate::modules::classes::service::ClassService;
use crate::modules::users::service::UserService;

use super::model::{
    CreateSubjectDto, Subject, SubjectDetails, SubjectFilterParams, UpdateSubjectDto,
};

const PROFESSOR_ROLE_REQUIRED: &str = "The assigned professor must have the professor role";
const DUPLICATE_SUBJECT: &str = "This class already has a subject with this name";

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db))]
    pub async fn create_subject(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        ClassService::get_class(db, dto.class_id).await?;
        if let Some(professor_id) = dto.professor_id {
            UserService::ensure_role(db, professor_id, Role::Professor, PROFESSOR_ROLE_REQUIRED)
                .await?;
        }

        let subject = sqlx::query_as::<_, Subject>(
            r#"INSERT INTO subjects (name, class_id, professor_id, coefficient)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, class_id, professor_id, coefficient, created_at, updated_at"#,
        )
        .bind(&dto.name)
        .bind(dto.class_id)
        .bind(dto.professor_id)
        .bind(dto.coefficient.unwrap_or(DEFAULT_COEFFICIENT))
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_SUBJECT))?;

        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn get_subjects(
        db: &PgPool,
        filters: SubjectFilterParams,
        pagination: PaginationParams,
    ) -> Result<Paginated<SubjectDetails>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM subjects
               WHERE ($1::UUID IS NULL OR class_id = $1)
                 AND ($2::UUID IS NULL OR professor_id = $2)"#,
        )
        .bind(filters.class_id)
        .bind(filters.professor_id)
        .fetch_one(db)
        .await?;

        let subjects = sqlx::query_as::<_, SubjectDetails>(
            r#"SELECT s.id, s.name, s.class_id, c.name AS class_name, s.professor_id,
                      CASE WHEN p.id IS NULL THEN NULL
                           ELSE p.first_name || ' ' || p.last_name END AS professor_name,
                      s.coefficient, s.created_at, s.updated_at
               FROM subjects s
               JOIN classes c ON c.id = s.class_id
               LEFT JOIN users p ON p.id = s.professor_id
               WHERE ($1::UUID IS NULL OR s.class_id = $1)
                 AND ($2::UUID IS NULL OR s.professor_id = $2)
               ORDER BY c.name, s.name
               LIMIT $3 OFFSET $4"#,
        )
        .bind(filters.class_id)
        .bind(filters.professor_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: subjects,
            meta: pagination.meta(total),
        })
    }

    /// Every subject matching `filters`, unpaginated.
    #[instrument(skip(db))]
    pub async fn list_subjects(
        db: &PgPool,
        filters: SubjectFilterParams,
    ) -> Result<Vec<SubjectDetails>, AppError> {
        let subjects = sqlx::query_as::<_, SubjectDetails>(
            r#"SELECT s.id, s.name, s.class_id, c.name AS class_name, s.professor_id,
                      CASE WHEN p.id IS NULL THEN NULL
                           ELSE p.first_name || ' ' || p.last_name END AS professor_name,
                      s.coefficient, s.created_at, s.updated_at
               FROM subjects s
               JOIN classes c ON c.id = s.class_id
               LEFT JOIN users p ON p.id = s.professor_id
               WHERE ($1::UUID IS NULL OR s.class_id = $1)
                 AND ($2::UUID IS NULL OR s.professor_id = $2)
               ORDER BY c.name, s.name"#,
        )
        .bind(filters.class_id)
        .bind(filters.professor_id)
        .fetch_all(db)
        .await?;

        Ok(subjects)
    }

    #[instrument(skip(db))]
    pub async fn get_subject(db: &PgPool, id: SubjectId) -> Result<SubjectDetails, AppError> {
        sqlx::query_as::<_, SubjectDetails>(
            r#"SELECT s.id, s.name, s.class_id, c.name AS class_name, s.professor_id,
                      CASE WHEN p.id IS NULL THEN NULL
                           ELSE p.first_name || ' ' || p.last_name END AS professor_name,
                      s.coefficient, s.created_at, s.updated_at
               FROM subjects s
               JOIN classes c ON c.id = s.class_id
               LEFT JOIN users p ON p.id = s.professor_id
               WHERE s.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Subject not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_subject(
        db: &PgPool,
        id: SubjectId,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        let existing = Self::get_subject(db, id).await?;

        if let Some(class_id) = dto.class_id {
            ClassService::get_class(db, class_id).await?;
        }
        if let Some(professor_id) = dto.professor_id {
            UserService::ensure_role(db, professor_id, Role::Professor, PROFESSOR_ROLE_REQUIRED)
                .await?;
        }

        let subject = sqlx::query_as::<_, Subject>(
            r#"UPDATE subjects
               SET name = $2, class_id = $3, professor_id = $4, coefficient = $5,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, class_id, professor_id, coefficient, created_at, updated_at"#,
        )
        .bind(id)
        .bind(dto.name.unwrap_or(existing.name))
        .bind(dto.class_id.unwrap_or(existing.class_id))
        .bind(dto.professor_id.or(existing.professor_id))
        .bind(dto.coefficient.unwrap_or(existing.coefficient))
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_SUBJECT))?;

        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn delete_subject(db: &PgPool, id: SubjectId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Subject not found")));
        }
        Ok(())
    }

    /// Whether `professor_id` is the professor assigned to the subject.
    #[instrument(skip(db))]
    pub async fn is_taught_by(
        db: &PgPool,
        id: SubjectId,
        professor_id: UserId,
    ) -> Result<bool, AppError> {
        let assigned = sqlx::query_scalar::<_, Option<UserId>>(
            "SELECT professor_id FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Subject not found")))?;

        Ok(assigned == Some(professor_id))
    }
}
