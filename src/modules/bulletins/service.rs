use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::BulletinId;

use crate::modules::classes::service::ClassService;

use super::model::{
    Bulletin, BulletinFilterParams, CreateBulletinDto, DEFAULT_TERM_NAME, UpdateBulletinDto,
};

pub struct BulletinService;

impl BulletinService {
    #[instrument(skip(db))]
    pub async fn create_bulletin(
        db: &PgPool,
        dto: CreateBulletinDto,
    ) -> Result<Bulletin, AppError> {
        ClassService::get_class(db, dto.class_id).await?;

        let bulletin = sqlx::query_as::<_, Bulletin>(
            r#"WITH inserted AS (
                   INSERT INTO bulletins (class_id, term_name)
                   VALUES ($1, $2)
                   RETURNING id, class_id, term_name, is_confirmed, created_at
               )
               SELECT i.id, i.class_id, c.name AS class_name, i.term_name, i.is_confirmed,
                      i.created_at
               FROM inserted i
               JOIN classes c ON c.id = i.class_id"#,
        )
        .bind(dto.class_id)
        .bind(dto.term_name.as_deref().unwrap_or(DEFAULT_TERM_NAME))
        .fetch_one(db)
        .await?;

        Ok(bulletin)
    }

    #[instrument(skip(db))]
    pub async fn get_bulletins(
        db: &PgPool,
        filters: BulletinFilterParams,
        pagination: PaginationParams,
    ) -> Result<Paginated<Bulletin>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM bulletins
               WHERE ($1::UUID IS NULL OR class_id = $1)
                 AND ($2::BOOLEAN IS NULL OR is_confirmed = $2)"#,
        )
        .bind(filters.class_id)
        .bind(filters.is_confirmed)
        .fetch_one(db)
        .await?;

        let bulletins = sqlx::query_as::<_, Bulletin>(
            r#"SELECT b.id, b.class_id, c.name AS class_name, b.term_name, b.is_confirmed,
                      b.created_at
               FROM bulletins b
               JOIN classes c ON c.id = b.class_id
               WHERE ($1::UUID IS NULL OR b.class_id = $1)
                 AND ($2::BOOLEAN IS NULL OR b.is_confirmed = $2)
               ORDER BY b.created_at DESC, b.id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(filters.class_id)
        .bind(filters.is_confirmed)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: bulletins,
            meta: pagination.meta(total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_bulletin(db: &PgPool, id: BulletinId) -> Result<Bulletin, AppError> {
        sqlx::query_as::<_, Bulletin>(
            r#"SELECT b.id, b.class_id, c.name AS class_name, b.term_name, b.is_confirmed,
                      b.created_at
               FROM bulletins b
               JOIN classes c ON c.id = b.class_id
               WHERE b.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Bulletin not found")))
    }

    /// Confirmation state is left untouched. A confirmed bulletin keeps its
    /// class; only its term name may change.
    #[instrument(skip(db))]
    pub async fn update_bulletin(
        db: &PgPool,
        id: BulletinId,
        dto: UpdateBulletinDto,
    ) -> Result<Bulletin, AppError> {
        let existing = Self::get_bulletin(db, id).await?;
        if let Some(class_id) = dto.class_id {
            if existing.is_confirmed && class_id != existing.class_id {
                return Err(AppError::bad_request(anyhow!(
                    "A confirmed bulletin cannot be moved to another class"
                )));
            }
            ClassService::get_class(db, class_id).await?;
        }

        let bulletin = sqlx::query_as::<_, Bulletin>(
            r#"WITH updated AS (
                   UPDATE bulletins
                   SET class_id = $2, term_name = $3
                   WHERE id = $1
                   RETURNING id, class_id, term_name, is_confirmed, created_at
               )
               SELECT u.id, u.class_id, c.name AS class_name, u.term_name, u.is_confirmed,
                      u.created_at
               FROM updated u
               JOIN classes c ON c.id = u.class_id"#,
        )
        .bind(id)
        .bind(dto.class_id.unwrap_or(existing.class_id))
        .bind(dto.term_name.unwrap_or(existing.term_name))
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Bulletin not found")))?;

        Ok(bulletin)
    }

    #[instrument(skip(db))]
    pub async fn delete_bulletin(db: &PgPool, id: BulletinId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bulletins WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Bulletin not found")));
        }
        Ok(())
    }

    /// Marks the bulletin confirmed. Confirming twice is a no-op.
    #[instrument(skip(db))]
    pub async fn confirm_bulletin(db: &PgPool, id: BulletinId) -> Result<Bulletin, AppError> {
        let bulletin = sqlx::query_as::<_, Bulletin>(
            r#"WITH confirmed AS (
                   UPDATE bulletins
                   SET is_confirmed = TRUE
                   WHERE id = $1
                   RETURNING id, class_id, term_name, is_confirmed, created_at
               )
               SELECT b.id, b.class_id, c.name AS class_name, b.term_name, b.is_confirmed,
                      b.created_at
               FROM confirmed b
               JOIN classes c ON c.id = b.class_id"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Bulletin not found")))?;

        info!(
            bulletin_id = %bulletin.id,
            class_id = %bulletin.class_id,
            term_name = %bulletin.term_name,
            "Bulletin confirmed"
        );
        Ok(bulletin)
    }
}
