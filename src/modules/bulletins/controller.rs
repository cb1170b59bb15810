use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use gradebook_core::{AppError, Capability, Paginated, PaginationParams, Role, StudentScope};
use gradebook_grading::{GradingError, ReportData};
use gradebook_models::{BulletinId, UserId};

use crate::grading::{into_app_error, record_malformed};
use crate::metrics::{track_bulletin_confirmed, track_bulletin_rendered};
use crate::middleware::auth::{AuthUser, RequireDownloadClassBulletin, RequireManageBulletins};
use crate::modules::auth::controller::ErrorResponse;
use crate::reports::{DownloadParams, FormatParams, download_response};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Bulletin, BulletinFilterParams, ConfirmBulletinResponse, CreateBulletinDto, UpdateBulletinDto,
};
use super::service::BulletinService;

#[utoipa::path(
    post,
    path = "/api/bulletins",
    request_body = CreateBulletinDto,
    responses(
        (status = 201, description = "Draft bulletin created", body = Bulletin),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_bulletin(
    State(state): State<AppState>,
    RequireManageBulletins(_auth_user): RequireManageBulletins,
    ValidatedJson(dto): ValidatedJson<CreateBulletinDto>,
) -> Result<(StatusCode, Json<Bulletin>), AppError> {
    let bulletin = BulletinService::create_bulletin(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(bulletin)))
}

#[utoipa::path(
    get,
    path = "/api/bulletins",
    params(PaginationParams, BulletinFilterParams),
    responses(
        (status = 200, description = "Page of bulletins", body = Paginated<Bulletin>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_bulletins(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<BulletinFilterParams>,
) -> Result<Json<Paginated<Bulletin>>, AppError> {
    let bulletins = BulletinService::get_bulletins(&state.db, filters, pagination).await?;
    Ok(Json(bulletins))
}

#[utoipa::path(
    get,
    path = "/api/bulletins/{id}",
    params(("id" = String, Path, description = "Bulletin ID")),
    responses(
        (status = 200, description = "Bulletin details", body = Bulletin),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Bulletin not found", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_bulletin(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<BulletinId>,
) -> Result<Json<Bulletin>, AppError> {
    let bulletin = BulletinService::get_bulletin(&state.db, id).await?;
    Ok(Json(bulletin))
}

#[utoipa::path(
    put,
    path = "/api/bulletins/{id}",
    params(("id" = String, Path, description = "Bulletin ID")),
    request_body = UpdateBulletinDto,
    responses(
        (status = 200, description = "Bulletin updated", body = Bulletin),
        (status = 400, description = "Confirmed bulletin moved to another class", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Bulletin or class not found", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_bulletin(
    State(state): State<AppState>,
    RequireManageBulletins(_auth_user): RequireManageBulletins,
    Path(id): Path<BulletinId>,
    ValidatedJson(dto): ValidatedJson<UpdateBulletinDto>,
) -> Result<Json<Bulletin>, AppError> {
    let bulletin = BulletinService::update_bulletin(&state.db, id, dto).await?;
    Ok(Json(bulletin))
}

#[utoipa::path(
    delete,
    path = "/api/bulletins/{id}",
    params(("id" = String, Path, description = "Bulletin ID")),
    responses(
        (status = 204, description = "Bulletin deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Bulletin not found", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_bulletin(
    State(state): State<AppState>,
    RequireManageBulletins(_auth_user): RequireManageBulletins,
    Path(id): Path<BulletinId>,
) -> Result<StatusCode, AppError> {
    BulletinService::delete_bulletin(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/bulletins/{id}/confirm",
    params(("id" = String, Path, description = "Bulletin ID")),
    responses(
        (status = 200, description = "Bulletin confirmed", body = ConfirmBulletinResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Bulletin not found", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn confirm_bulletin(
    State(state): State<AppState>,
    RequireManageBulletins(_auth_user): RequireManageBulletins,
    Path(id): Path<BulletinId>,
) -> Result<Json<ConfirmBulletinResponse>, AppError> {
    let bulletin = BulletinService::confirm_bulletin(&state.db, id).await?;
    track_bulletin_confirmed();

    Ok(Json(ConfirmBulletinResponse {
        message: format!(
            "Bulletin '{}' for class '{}' has been confirmed.",
            bulletin.term_name, bulletin.class_name
        ),
        bulletin,
    }))
}

#[utoipa::path(
    get,
    path = "/api/bulletins/{id}/download",
    params(("id" = String, Path, description = "Bulletin ID"), DownloadParams),
    responses(
        (status = 200, description = "The class bulletin as an attachment", body = String, content_type = "text/html"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only, or bulletin not confirmed", body = ErrorResponse),
        (status = 404, description = "Bulletin not found", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn download_class_bulletin(
    State(state): State<AppState>,
    RequireDownloadClassBulletin(_auth_user): RequireDownloadClassBulletin,
    Path(id): Path<BulletinId>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, AppError> {
    let report = state
        .grading
        .class_bulletin(id, params.ranked.unwrap_or(false))
        .await
        .map_err(into_app_error)?;
    record_malformed(report.students.iter().map(|line| line.malformed));

    let format = params.format.unwrap_or_default();
    let document = format.render(&state.reports, &ReportData::ClassBulletin(report))?;
    track_bulletin_rendered("class", format.as_str());
    download_response(document)
}

fn student_bulletin_denial(role: Role) -> &'static str {
    match role {
        Role::Student => "You can only download your own bulletin.",
        Role::Parent => "You can only download bulletin for your child.",
        Role::Admin | Role::Professor => "Role not allowed to download single-student bulletin.",
    }
}

#[utoipa::path(
    get,
    path = "/api/bulletins/{id}/students/{student_id}/download",
    params(
        ("id" = String, Path, description = "Bulletin ID"),
        ("student_id" = String, Path, description = "Student ID"),
        FormatParams
    ),
    responses(
        (status = 200, description = "One student's bulletin, with class rank, as an attachment", body = String, content_type = "text/html"),
        (status = 400, description = "Student not in the bulletin's class", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed, or bulletin not confirmed", body = ErrorResponse),
        (status = 404, description = "Bulletin or student not found", body = ErrorResponse)
    ),
    tag = "Bulletins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn download_student_bulletin(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, student_id)): Path<(BulletinId, UserId)>,
    Query(params): Query<FormatParams>,
) -> Result<Response, AppError> {
    let target = state
        .grading
        .student_bulletin_target(id, student_id)
        .await
        .map_err(|err| match err {
            GradingError::StudentNotFound => {
                AppError::not_found(anyhow::anyhow!("Invalid student ID."))
            }
            other => into_app_error(other),
        })?;

    let scope = StudentScope {
        student_id: target.student.id.into_inner(),
        parent_id: target.student.parent_id.map(UserId::into_inner),
    };
    if auth_user
        .authorize(Capability::DownloadStudentBulletin, Some(&scope))
        .is_err()
    {
        return Err(AppError::forbidden(student_bulletin_denial(auth_user.role())));
    }

    let report = state
        .grading
        .student_bulletin(target)
        .await
        .map_err(into_app_error)?;
    record_malformed(report.students.iter().map(|line| line.malformed));

    let format = params.format.unwrap_or_default();
    let document = format.render(&state.reports, &ReportData::StudentBulletin(report))?;
    track_bulletin_rendered("student", format.as_str());
    download_response(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_bulletin_denial_by_role() {
        assert_eq!(
            student_bulletin_denial(Role::Student),
            "You can only download your own bulletin."
        );
        assert_eq!(
            student_bulletin_denial(Role::Parent),
            "You can only download bulletin for your child."
        );
        assert_eq!(
            student_bulletin_denial(Role::Professor),
            "Role not allowed to download single-student bulletin."
        );
    }
}
