use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams};
use gradebook_models::SubjectId;

use crate::middleware::auth::{AuthUser, RequireManageSubjects, RequireViewTeachingLoad};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateSubjectDto, Subject, SubjectDetails, SubjectFilterParams, UpdateSubjectDto,
};
use super::service::SubjectService;

#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectDto,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 400, description = "Duplicate name in class or professor lacks the professor role", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_subject(
    State(state): State<AppState>,
    RequireManageSubjects(_auth_user): RequireManageSubjects,
    ValidatedJson(dto): ValidatedJson<CreateSubjectDto>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = SubjectService::create_subject(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[utoipa::path(
    get,
    path = "/api/subjects",
    params(PaginationParams, SubjectFilterParams),
    responses(
        (status = 200, description = "Page of subjects", body = Paginated<SubjectDetails>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subjects(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<SubjectFilterParams>,
) -> Result<Json<Paginated<SubjectDetails>>, AppError> {
    let subjects = SubjectService::get_subjects(&state.db, filters, pagination).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    get,
    path = "/api/subjects/mine",
    responses(
        (status = 200, description = "Subjects assigned to the professor", body = Vec<SubjectDetails>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Professors only", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_subjects(
    State(state): State<AppState>,
    RequireViewTeachingLoad(auth_user): RequireViewTeachingLoad,
) -> Result<Json<Vec<SubjectDetails>>, AppError> {
    let filters = SubjectFilterParams {
        professor_id: Some(auth_user.user_id()?),
        ..Default::default()
    };
    let subjects = SubjectService::list_subjects(&state.db, filters).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = String, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = SubjectDetails),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subject(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<SubjectId>,
) -> Result<Json<SubjectDetails>, AppError> {
    let subject = SubjectService::get_subject(&state.db, id).await?;
    Ok(Json(subject))
}

#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(("id" = String, Path, description = "Subject ID")),
    request_body = UpdateSubjectDto,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 400, description = "Duplicate name in class or professor lacks the professor role", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Subject or class not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_subject(
    State(state): State<AppState>,
    RequireManageSubjects(_auth_user): RequireManageSubjects,
    Path(id): Path<SubjectId>,
    ValidatedJson(dto): ValidatedJson<UpdateSubjectDto>,
) -> Result<Json<Subject>, AppError> {
    let subject = SubjectService::update_subject(&state.db, id, dto).await?;
    Ok(Json(subject))
}

#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(("id" = String, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_subject(
    State(state): State<AppState>,
    RequireManageSubjects(_auth_user): RequireManageSubjects,
    Path(id): Path<SubjectId>,
) -> Result<StatusCode, AppError> {
    SubjectService::delete_subject(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
