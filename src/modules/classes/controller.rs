use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::ClassId;

use crate::middleware::auth::{AuthUser, RequireManageClasses, RequireViewTeachingLoad};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::subjects::model::{SubjectDetails, SubjectFilterParams};
use crate::modules::subjects::service::SubjectService;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{Class, ClassWithStats, CreateClassDto, UpdateClassDto};
use super::service::ClassService;

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Duplicate class name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireManageClasses(_auth_user): RequireManageClasses,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class = ClassService::create_class(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of classes with student counts", body = Paginated<ClassWithStats>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classes(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Paginated<ClassWithStats>>, AppError> {
    let classes = ClassService::get_classes(&state.db, pagination).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/classes/mine",
    responses(
        (status = 200, description = "Classes the professor teaches in", body = Vec<ClassWithStats>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Professors only", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_classes(
    State(state): State<AppState>,
    RequireViewTeachingLoad(auth_user): RequireViewTeachingLoad,
) -> Result<Json<Vec<ClassWithStats>>, AppError> {
    let classes = ClassService::get_classes_taught_by(&state.db, auth_user.user_id()?).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details", body = ClassWithStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ClassId>,
) -> Result<Json<ClassWithStats>, AppError> {
    let class = ClassService::get_class(&state.db, id).await?;
    Ok(Json(class))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Students enrolled in the class", body = Vec<User>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class_students(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ClassId>,
) -> Result<Json<Vec<User>>, AppError> {
    ClassService::get_class(&state.db, id).await?;
    let students = UserService::get_students_in_class(&state.db, id).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/subjects",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Subjects taught in the class", body = Vec<SubjectDetails>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class_subjects(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<ClassId>,
) -> Result<Json<Vec<SubjectDetails>>, AppError> {
    ClassService::get_class(&state.db, id).await?;
    let filters = SubjectFilterParams {
        class_id: Some(id),
        ..Default::default()
    };
    let subjects = SubjectService::list_subjects(&state.db, filters).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = String, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 400, description = "Duplicate class name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireManageClasses(_auth_user): RequireManageClasses,
    Path(id): Path<ClassId>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::update_class(&state.db, id, dto).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireManageClasses(_auth_user): RequireManageClasses,
    Path(id): Path<ClassId>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_class(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
