use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgPool;
use tracing::instrument;

use gradebook_core::{AppError, Paginated, PaginationParams, Role};
use gradebook_models::{AssignmentId, SubjectId};

use crate::middleware::auth::{AuthUser, RequireCreateAssignments};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::subjects::service::SubjectService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Assignment, AssignmentFilterParams, CreateAssignmentDto, UpdateAssignmentDto,
};
use super::service::AssignmentService;

/// Professors may only manage assignments of subjects assigned to them.
async fn ensure_subject_access(
    db: &PgPool,
    auth_user: &AuthUser,
    subject_id: SubjectId,
) -> Result<(), AppError> {
    if auth_user.role() != Role::Professor {
        return Ok(());
    }
    if !SubjectService::is_taught_by(db, subject_id, auth_user.user_id()?).await? {
        return Err(AppError::forbidden("You are not assigned to this subject."));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed for this subject", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_assignment(
    State(state): State<AppState>,
    RequireCreateAssignments(auth_user): RequireCreateAssignments,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    ensure_subject_access(&state.db, &auth_user, dto.subject_id).await?;
    let assignment = AssignmentService::create_assignment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    get,
    path = "/api/assignments",
    params(PaginationParams, AssignmentFilterParams),
    responses(
        (status = 200, description = "Page of assignments", body = Paginated<Assignment>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<AssignmentFilterParams>,
) -> Result<Json<Paginated<Assignment>>, AppError> {
    let assignments = AssignmentService::get_assignments(&state.db, filters, pagination).await?;
    Ok(Json(assignments))
}

#[utoipa::path(
    get,
    path = "/api/assignments/{id}",
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment details", body = Assignment),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<AssignmentId>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = AssignmentService::get_assignment(&state.db, id).await?;
    Ok(Json(assignment))
}

#[utoipa::path(
    put,
    path = "/api/assignments/{id}",
    params(("id" = String, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentDto,
    responses(
        (status = 200, description = "Assignment updated", body = Assignment),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed for this subject", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_assignment(
    State(state): State<AppState>,
    RequireCreateAssignments(auth_user): RequireCreateAssignments,
    Path(id): Path<AssignmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateAssignmentDto>,
) -> Result<Json<Assignment>, AppError> {
    let existing = AssignmentService::get_assignment(&state.db, id).await?;
    ensure_subject_access(&state.db, &auth_user, existing.subject_id).await?;
    let assignment = AssignmentService::update_assignment(&state.db, id, dto).await?;
    Ok(Json(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/assignments/{id}",
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment and its grades deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed for this subject", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    RequireCreateAssignments(auth_user): RequireCreateAssignments,
    Path(id): Path<AssignmentId>,
) -> Result<StatusCode, AppError> {
    let existing = AssignmentService::get_assignment(&state.db, id).await?;
    ensure_subject_access(&state.db, &auth_user, existing.subject_id).await?;
    AssignmentService::delete_assignment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
