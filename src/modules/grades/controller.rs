use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use gradebook_core::{AppError, Capability, Paginated, PaginationParams};
use gradebook_grading::ReportData;
use gradebook_models::{ClassId, GradeId, UserId};

use crate::grading::{into_app_error, record_malformed};
use crate::metrics::{track_bulletin_rendered, track_grade_recorded};
use crate::middleware::auth::{AuthUser, RequireRecordGrades, RequireViewGradebook};
use crate::modules::auth::controller::ErrorResponse;
use crate::reports::{FormatParams, download_response};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AverageResult, ClassRanking, CreateGradeDto, Grade, GradeFilterParams, StudentReport,
    UpdateGradeDto,
};
use super::service::GradeService;

/// Loads a grade the caller authored.
async fn owned_grade(state: &AppState, auth_user: &AuthUser, id: GradeId) -> Result<Grade, AppError> {
    let grade = GradeService::get_grade(&state.db, id).await?;
    if grade.professor_id != auth_user.user_id()? {
        return Err(AppError::forbidden("You can only modify grades you recorded."));
    }
    Ok(grade)
}

/// Checks that the caller may see `student_id`'s record.
async fn authorize_student_record(
    state: &AppState,
    auth_user: &AuthUser,
    student_id: UserId,
) -> Result<(), AppError> {
    let scope = GradeService::student_scope(&state.db, student_id).await?;
    auth_user.authorize(Capability::ViewStudentRecord, Some(&scope))
}

#[utoipa::path(
    post,
    path = "/api/grades",
    request_body = CreateGradeDto,
    responses(
        (status = 201, description = "Grade recorded", body = Grade),
        (status = 400, description = "Duplicate grade or target is not a student", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Professors only", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 422, description = "Grade outside 0 to 20", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_grade(
    State(state): State<AppState>,
    RequireRecordGrades(auth_user): RequireRecordGrades,
    ValidatedJson(dto): ValidatedJson<CreateGradeDto>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    let grade = GradeService::create_grade(&state.db, auth_user.user_id()?, dto).await?;
    track_grade_recorded();
    Ok((StatusCode::CREATED, Json(grade)))
}

#[utoipa::path(
    get,
    path = "/api/grades",
    params(PaginationParams, GradeFilterParams),
    responses(
        (status = 200, description = "Page of grades", body = Paginated<Grade>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admins and professors only", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_grades(
    State(state): State<AppState>,
    RequireViewGradebook(_auth_user): RequireViewGradebook,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<GradeFilterParams>,
) -> Result<Json<Paginated<Grade>>, AppError> {
    let grades = GradeService::get_grades(&state.db, filters, pagination).await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    params(("id" = String, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade details", body = Grade),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed to view this student's record", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_grade(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<GradeId>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::get_grade(&state.db, id).await?;
    authorize_student_record(&state, &auth_user, grade.student_id).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    params(("id" = String, Path, description = "Grade ID")),
    request_body = UpdateGradeDto,
    responses(
        (status = 200, description = "Grade updated", body = Grade),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only the authoring professor", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse),
        (status = 422, description = "Grade outside 0 to 20", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_grade(
    State(state): State<AppState>,
    RequireRecordGrades(auth_user): RequireRecordGrades,
    Path(id): Path<GradeId>,
    ValidatedJson(dto): ValidatedJson<UpdateGradeDto>,
) -> Result<Json<Grade>, AppError> {
    owned_grade(&state, &auth_user, id).await?;
    let grade = GradeService::update_grade(&state.db, id, dto).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    params(("id" = String, Path, description = "Grade ID")),
    responses(
        (status = 204, description = "Grade deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only the authoring professor", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_grade(
    State(state): State<AppState>,
    RequireRecordGrades(auth_user): RequireRecordGrades,
    Path(id): Path<GradeId>,
) -> Result<StatusCode, AppError> {
    owned_grade(&state, &auth_user, id).await?;
    GradeService::delete_grade(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/grades/students/{id}/average",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "The student's weighted average", body = AverageResult),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed to view this student's record", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_average(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<AverageResult>, AppError> {
    authorize_student_record(&state, &auth_user, id).await?;
    let average = state
        .grading
        .student_average(id)
        .await
        .map_err(into_app_error)?;
    record_malformed([average.malformed]);
    Ok(Json(average))
}

#[utoipa::path(
    get,
    path = "/api/grades/students/{id}/report",
    params(("id" = String, Path, description = "Student ID"), FormatParams),
    responses(
        (status = 200, description = "The student's average and every grade behind it; a download when `format` is given", body = StudentReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed to view this student's record", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
    Query(params): Query<FormatParams>,
) -> Result<Response, AppError> {
    authorize_student_record(&state, &auth_user, id).await?;
    let report = state
        .grading
        .student_report(id)
        .await
        .map_err(into_app_error)?;
    record_malformed([report.malformed]);

    match params.format {
        None => Ok(Json(report).into_response()),
        Some(format) => {
            let document = format.render(&state.reports, &ReportData::Student(report))?;
            track_bulletin_rendered("report", format.as_str());
            download_response(document)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/grades/classes/{id}/ranking",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Enrolled students by descending weighted average", body = ClassRanking),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admins and professors only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class_ranking(
    State(state): State<AppState>,
    RequireViewGradebook(_auth_user): RequireViewGradebook,
    Path(id): Path<ClassId>,
) -> Result<Json<ClassRanking>, AppError> {
    let ranking = state
        .grading
        .class_ranking(id)
        .await
        .map_err(into_app_error)?;
    record_malformed(ranking.ranking.iter().map(|entry| entry.malformed));
    Ok(Json(ranking))
}
