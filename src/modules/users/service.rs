use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams, Role, hash_password};
use gradebook_models::{ClassId, UserId};

use crate::metrics::track_user_created;

use super::model::{
    ClassStudents, CreateUserDto, UpdateRoleDto, UpdateUserDto, User, UserFilterParams,
};

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(username = %dto.username, role = %dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        check_links(db, dto.role, dto.class_id, dto.parent_id).await?;

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, first_name, last_name, email, password, role, class_id, parent_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, username, first_name, last_name, email, role, class_id, parent_id,
                         created_at, updated_at"#,
        )
        .bind(&dto.username)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(dto.role)
        .bind(dto.class_id)
        .bind(dto.parent_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "A user with this username or email already exists")
        })?;

        track_user_created(user.role.as_str());
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
        pagination: PaginationParams,
    ) -> Result<Paginated<User>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM users
               WHERE ($1::TEXT IS NULL OR role = $1)
                 AND ($2::UUID IS NULL OR class_id = $2)"#,
        )
        .bind(filters.role)
        .bind(filters.class_id)
        .fetch_one(db)
        .await?;

        let users = sqlx::query_as::<_, User>(
            r#"SELECT id, username, first_name, last_name, email, role, class_id, parent_id,
                      created_at, updated_at
               FROM users
               WHERE ($1::TEXT IS NULL OR role = $1)
                 AND ($2::UUID IS NULL OR class_id = $2)
               ORDER BY last_name, first_name, id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(filters.role)
        .bind(filters.class_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated {
            data: users,
            meta: pagination.meta(total),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, username, first_name, last_name, email, role, class_id, parent_id,
                      created_at, updated_at
               FROM users
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user(
        db: &PgPool,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(db, id).await?;

        let class_id = dto.class_id.or(existing.class_id);
        let parent_id = dto.parent_id.or(existing.parent_id);
        if dto.class_id.is_some() || dto.parent_id.is_some() {
            check_links(db, existing.role, dto.class_id, dto.parent_id).await?;
        }
        if parent_id == Some(id) {
            return Err(AppError::bad_request(anyhow!(
                "A user cannot be their own parent"
            )));
        }

        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET first_name = $2, last_name = $3, email = $4, class_id = $5, parent_id = $6,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, username, first_name, last_name, email, role, class_id, parent_id,
                         created_at, updated_at"#,
        )
        .bind(id)
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(dto.email.unwrap_or(existing.email))
        .bind(class_id)
        .bind(parent_id)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A user with this email already exists"))?;

        Ok(user)
    }

    /// Changing away from the student role clears class and parent links.
    #[instrument(skip(db))]
    pub async fn update_role(
        db: &PgPool,
        id: UserId,
        dto: UpdateRoleDto,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET role = $2,
                   class_id = CASE WHEN $2 = 'student' THEN class_id END,
                   parent_id = CASE WHEN $2 = 'student' THEN parent_id END,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, username, first_name, last_name, email, role, class_id, parent_id,
                         created_at, updated_at"#,
        )
        .bind(id)
        .bind(dto.role)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, id: UserId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_children(db: &PgPool, parent_id: UserId) -> Result<Vec<User>, AppError> {
        let children = sqlx::query_as::<_, User>(
            r#"SELECT id, username, first_name, last_name, email, role, class_id, parent_id,
                      created_at, updated_at
               FROM users
               WHERE parent_id = $1 AND role = 'student'
               ORDER BY last_name, first_name, id"#,
        )
        .bind(parent_id)
        .fetch_all(db)
        .await?;

        Ok(children)
    }

    /// Students of every class the professor teaches a subject in.
    #[instrument(skip(db))]
    pub async fn get_students_taught_by(
        db: &PgPool,
        professor_id: UserId,
    ) -> Result<Vec<ClassStudents>, AppError> {
        let classes = sqlx::query_as::<_, (ClassId, String)>(
            r#"SELECT DISTINCT c.id, c.name
               FROM classes c
               JOIN subjects s ON s.class_id = c.id
               WHERE s.professor_id = $1
               ORDER BY c.name"#,
        )
        .bind(professor_id)
        .fetch_all(db)
        .await?;

        let mut result = Vec::with_capacity(classes.len());
        for (class_id, class_name) in classes {
            let students = Self::get_students_in_class(db, class_id).await?;
            result.push(ClassStudents {
                class_id,
                class_name,
                students,
            });
        }
        Ok(result)
    }

    #[instrument(skip(db))]
    pub async fn get_students_in_class(
        db: &PgPool,
        class_id: ClassId,
    ) -> Result<Vec<User>, AppError> {
        let students = sqlx::query_as::<_, User>(
            r#"SELECT id, username, first_name, last_name, email, role, class_id, parent_id,
                      created_at, updated_at
               FROM users
               WHERE class_id = $1 AND role = 'student'
               ORDER BY last_name, first_name, id"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(students)
    }

    /// Fails with 400 unless `id` is an account holding `role`.
    pub async fn ensure_role(
        db: &PgPool,
        id: UserId,
        role: Role,
        message: &'static str,
    ) -> Result<(), AppError> {
        let actual = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;

        if actual != Some(role) {
            return Err(AppError::bad_request(anyhow!(message)));
        }
        Ok(())
    }
}

/// Class membership and parent links are only meaningful for students, and
/// must point at an existing class and a parent account.
async fn check_links(
    db: &PgPool,
    role: Role,
    class_id: Option<ClassId>,
    parent_id: Option<UserId>,
) -> Result<(), AppError> {
    if role != Role::Student && (class_id.is_some() || parent_id.is_some()) {
        return Err(AppError::bad_request(anyhow!(
            "Only students can belong to a class or be linked to a parent"
        )));
    }

    if let Some(class_id) = class_id {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
                .bind(class_id)
                .fetch_one(db)
                .await?;
        if !exists {
            return Err(AppError::bad_request(anyhow!("Class does not exist")));
        }
    }

    if let Some(parent_id) = parent_id {
        UserService::ensure_role(
            db,
            parent_id,
            Role::Parent,
            "parent_id must reference a parent account",
        )
        .await?;
    }

    Ok(())
}
