use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use gradebook_core::{AppError, Capability, Paginated, PaginationParams, Role};
use gradebook_models::{ClassId, PresenceId, UserId};

use crate::metrics::track_attendance_marked;
use crate::middleware::auth::{
    AuthUser, RequireMarkAttendance, RequireViewAttendanceStats, RequireViewOwnAttendance,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::classes::service::ClassService;
use crate::modules::grades::service::GradeService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AttendanceFilterParams, AttendanceStatsParams, ClassAttendanceStats, MarkAttendanceDto,
    Presence, UpdateAttendanceDto,
};
use super::service::AttendanceService;

/// Professors may only mark attendance in classes they teach.
async fn ensure_class_access(
    state: &AppState,
    auth_user: &AuthUser,
    class_id: ClassId,
) -> Result<(), AppError> {
    if auth_user.role() != Role::Professor {
        return Ok(());
    }
    if !ClassService::is_taught_by(&state.db, class_id, auth_user.user_id()?).await? {
        return Err(AppError::forbidden("You do not teach this class."));
    }
    Ok(())
}

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
    path = "/api/attendance",
    request_body = MarkAttendanceDto,
    responses(
        (status = 201, description = "Attendance marked", body = Presence),
        (status = 400, description = "Already marked, not a student, or not in this class", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admins and the class's professors only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    RequireMarkAttendance(auth_user): RequireMarkAttendance,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<(StatusCode, Json<Presence>), AppError> {
    ensure_class_access(&state, &auth_user, dto.class_id).await?;
    let presence = AttendanceService::mark_attendance(&state.db, auth_user.user_id()?, dto).await?;
    track_attendance_marked(presence.status.as_str());
    Ok((StatusCode::CREATED, Json(presence)))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(PaginationParams, AttendanceFilterParams),
    responses(
        (status = 200, description = "Page of attendance marks", body = Paginated<Presence>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admins and professors only", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance(
    State(state): State<AppState>,
    RequireMarkAttendance(_auth_user): RequireMarkAttendance,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<AttendanceFilterParams>,
) -> Result<Json<Paginated<Presence>>, AppError> {
    let presences = AttendanceService::get_attendance(&state.db, filters, pagination).await?;
    Ok(Json(presences))
}

#[utoipa::path(
    get,
    path = "/api/attendance/mine",
    responses(
        (status = 200, description = "The caller's attendance marks, newest first", body = Vec<Presence>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Students only", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_attendance(
    State(state): State<AppState>,
    RequireViewOwnAttendance(auth_user): RequireViewOwnAttendance,
) -> Result<Json<Vec<Presence>>, AppError> {
    let presences =
        AttendanceService::get_student_attendance(&state.db, auth_user.user_id()?).await?;
    Ok(Json(presences))
}

#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(AttendanceStatsParams),
    responses(
        (status = 200, description = "Mark counts per class", body = Vec<ClassAttendanceStats>),
        (status = 400, description = "from is after to", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance_stats(
    State(state): State<AppState>,
    RequireViewAttendanceStats(_auth_user): RequireViewAttendanceStats,
    Query(params): Query<AttendanceStatsParams>,
) -> Result<Json<Vec<ClassAttendanceStats>>, AppError> {
    let stats = AttendanceService::class_stats(&state.db, params).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/attendance/students/{id}",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "The student's attendance marks, newest first", body = Vec<Presence>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed to view this student's record", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Presence>>, AppError> {
    authorize_student_record(&state, &auth_user, id).await?;
    let presences = AttendanceService::get_student_attendance(&state.db, id).await?;
    Ok(Json(presences))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(("id" = String, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance mark", body = Presence),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not allowed to view this student's record", body = ErrorResponse),
        (status = 404, description = "Attendance record not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_presence(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<PresenceId>,
) -> Result<Json<Presence>, AppError> {
    let presence = AttendanceService::get_presence(&state.db, id).await?;
    authorize_student_record(&state, &auth_user, presence.student_id).await?;
    Ok(Json(presence))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = String, Path, description = "Attendance record ID")),
    request_body = UpdateAttendanceDto,
    responses(
        (status = 200, description = "Attendance updated", body = Presence),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admins and the class's professors only", body = ErrorResponse),
        (status = 404, description = "Attendance record not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_presence(
    State(state): State<AppState>,
    RequireMarkAttendance(auth_user): RequireMarkAttendance,
    Path(id): Path<PresenceId>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<Presence>, AppError> {
    let existing = AttendanceService::get_presence(&state.db, id).await?;
    ensure_class_access(&state, &auth_user, existing.class_id).await?;
    let presence = AttendanceService::update_presence(&state.db, id, dto).await?;
    Ok(Json(presence))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = String, Path, description = "Attendance record ID")),
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admins and the class's professors only", body = ErrorResponse),
        (status = 404, description = "Attendance record not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_presence(
    State(state): State<AppState>,
    RequireMarkAttendance(auth_user): RequireMarkAttendance,
    Path(id): Path<PresenceId>,
) -> Result<StatusCode, AppError> {
    let existing = AttendanceService::get_presence(&state.db, id).await?;
    ensure_class_access(&state, &auth_user, existing.class_id).await?;
    AttendanceService::delete_presence(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
