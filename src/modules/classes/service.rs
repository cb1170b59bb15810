use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::{ClassId, UserId};

use super::model::{Class, ClassWithStats, CreateClassDto, UpdateClassDto};

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db))]
    pub async fn create_class(db: &PgPool, dto: CreateClassDto) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(
            r#"INSERT INTO classes (name)
               VALUES ($1)
               RETURNING id, name, created_at, updated_at"#,
        )
        .bind(&dto.name)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A class with this name already exists"))?;

        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn get_classes(
        db: &PgPool,
        pagination: PaginationParams,
    ) -> Result<Paginated<ClassWithStats>, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes")
            .fetch_one(db)
            .await?;

        let classes = sqlx::query_as::<_, ClassWithStats>(
            r#"SELECT c.id, c.name, COUNT(u.id) AS student_count, c.created_at, c.updated_at
               FROM classes c
               LEFT JOIN users u ON u.class_id = c.id AND u.role = 'student'
               GROUP BY c.id
               ORDER BY c.name
               LIMIT $1 OFFSET $2"#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: classes,
            meta: pagination.meta(total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_class(db: &PgPool, id: ClassId) -> Result<ClassWithStats, AppError> {
        sqlx::query_as::<_, ClassWithStats>(
            r#"SELECT c.id, c.name, COUNT(u.id) AS student_count, c.created_at, c.updated_at
               FROM classes c
               LEFT JOIN users u ON u.class_id = c.id AND u.role = 'student'
               WHERE c.id = $1
               GROUP BY c.id"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))
    }

    /// Classes in which the professor teaches at least one subject.
    #[instrument(skip(db))]
    pub async fn get_classes_taught_by(
        db: &PgPool,
        professor_id: UserId,
    ) -> Result<Vec<ClassWithStats>, AppError> {
        let classes = sqlx::query_as::<_, ClassWithStats>(
            r#"SELECT c.id, c.name, COUNT(DISTINCT u.id) AS student_count, c.created_at, c.updated_at
               FROM classes c
               JOIN subjects s ON s.class_id = c.id AND s.professor_id = $1
               LEFT JOIN users u ON u.class_id = c.id AND u.role = 'student'
               GROUP BY c.id
               ORDER BY c.name"#,
        )
        .bind(professor_id)
        .fetch_all(db)
        .await?;

        Ok(classes)
    }

    /// Whether the professor teaches at least one subject in the class.
    #[instrument(skip(db))]
    pub async fn is_taught_by(
        db: &PgPool,
        id: ClassId,
        professor_id: UserId,
    ) -> Result<bool, AppError> {
        let teaches = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM subjects WHERE class_id = $1 AND professor_id = $2)",
        )
        .bind(id)
        .bind(professor_id)
        .fetch_one(db)
        .await?;

        Ok(teaches)
    }

    #[instrument(skip(db))]
    pub async fn update_class(
        db: &PgPool,
        id: ClassId,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>(
            r#"UPDATE classes SET name = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&dto.name)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A class with this name already exists"))?
        .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))
    }

    /// Cascades to the class's subjects, assignments, grades and bulletins.
    /// Students stay, without a class.
    #[instrument(skip(db))]
    pub async fn delete_class(db: &PgPool, id: ClassId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Class not found")));
        }
        Ok(())
    }
}
