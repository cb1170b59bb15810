use sqlx::{FromRow, PgPool};
use tracing::instrument;

use gradebook_auth::create_access_token;
use gradebook_config::JwtConfig;
use gradebook_core::{AppError, verify_password};
use gradebook_models::users::User;

use crate::metrics::{track_login_failure, track_login_success};

use super::model::{LoginRequest, LoginResponse};

pub struct AuthService;

#[derive(FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(username = %dto.username))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let found = sqlx::query_as::<_, UserWithPassword>(
            r#"SELECT id, username, first_name, last_name, email, role, class_id, parent_id,
                      created_at, updated_at, password
               FROM users
               WHERE username = $1"#,
        )
        .bind(&dto.username)
        .fetch_optional(db)
        .await?;

        let Some(UserWithPassword { user, password }) = found else {
            track_login_failure("unknown_user");
            return Err(invalid_credentials());
        };

        if !verify_password(&dto.password, &password)? {
            track_login_failure("wrong_password");
            return Err(invalid_credentials());
        }

        let access_token =
            create_access_token(user.id.into_inner(), &user.username, user.role, jwt_config)?;
        track_login_success(user.role.as_str());

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user,
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid username or password")
}
