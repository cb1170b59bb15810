use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::UserId;

use crate::middleware::auth::{
    AuthUser, RequireManageUsers, RequireViewChildren, RequireViewTeachingLoad,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    ClassStudents, CreateUserDto, UpdateRoleDto, UpdateUserDto, User, UserFilterParams,
};
use super::service::UserService;

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Duplicate username/email or invalid links", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams, UserFilterParams),
    responses(
        (status = 200, description = "Page of users", body = Paginated<User>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<Paginated<User>>, AppError> {
    let users = UserService::get_users(&state.db, filters, pagination).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The authenticated account", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, auth_user.user_id()?).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Duplicate email or invalid links", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user(&state.db, id, dto).await?;
    Ok(Json(user))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_user_role(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<UserId>,
    Json(dto): Json<UpdateRoleDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_role(&state.db, id, dto).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/my-children",
    responses(
        (status = 200, description = "Students linked to the parent", body = Vec<User>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Parents only", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_children(
    State(state): State<AppState>,
    RequireViewChildren(auth_user): RequireViewChildren,
) -> Result<Json<Vec<User>>, AppError> {
    let children = UserService::get_children(&state.db, auth_user.user_id()?).await?;
    Ok(Json(children))
}

#[utoipa::path(
    get,
    path = "/api/users/my-students",
    responses(
        (status = 200, description = "Students per class taught", body = Vec<ClassStudents>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Professors only", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_students(
    State(state): State<AppState>,
    RequireViewTeachingLoad(auth_user): RequireViewTeachingLoad,
) -> Result<Json<Vec<ClassStudents>>, AppError> {
    let classes = UserService::get_students_taught_by(&state.db, auth_user.user_id()?).await?;
    Ok(Json(classes))
}
