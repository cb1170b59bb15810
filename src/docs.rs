use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use gradebook_core::{PaginationMeta, PaginationParams, Role};
use gradebook_grading::{
    AverageResult, BulletinLine, BulletinReport, ClassRanking, GradeEntry, RankedStudent,
    Student, StudentReport, SubjectLine,
};

use crate::modules::assignments::model::{Assignment, CreateAssignmentDto, UpdateAssignmentDto};
use crate::modules::attendance::model::{
    AttendanceStatus, ClassAttendanceStats, MarkAttendanceDto, Presence, UpdateAttendanceDto,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{LoginRequest, LoginResponse};
use crate::modules::bulletins::model::{
    Bulletin, ConfirmBulletinResponse, CreateBulletinDto, UpdateBulletinDto,
};
use crate::modules::classes::model::{Class, ClassWithStats, CreateClassDto, UpdateClassDto};
use crate::modules::grades::model::{CreateGradeDto, Grade, UpdateGradeDto};
use crate::modules::subjects::model::{
    CreateSubjectDto, Subject, SubjectDetails, UpdateSubjectDto,
};
use crate::modules::users::model::{
    ClassStudents, CreateUserDto, UpdateRoleDto, UpdateUserDto, User,
};
use crate::reports::ReportFormat;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::update_user_role,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::get_my_children,
        crate::modules::users::controller::get_my_students,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_my_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::get_class_students,
        crate::modules::classes::controller::get_class_subjects,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_my_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::get_assignments,
        crate::modules::assignments::controller::get_assignment,
        crate::modules::assignments::controller::update_assignment,
        crate::modules::assignments::controller::delete_assignment,
        crate::modules::grades::controller::create_grade,
        crate::modules::grades::controller::get_grades,
        crate::modules::grades::controller::get_grade,
        crate::modules::grades::controller::update_grade,
        crate::modules::grades::controller::delete_grade,
        crate::modules::grades::controller::get_student_average,
        crate::modules::grades::controller::get_student_report,
        crate::modules::grades::controller::get_class_ranking,
        crate::modules::bulletins::controller::create_bulletin,
        crate::modules::bulletins::controller::get_bulletins,
        crate::modules::bulletins::controller::get_bulletin,
        crate::modules::bulletins::controller::update_bulletin,
        crate::modules::bulletins::controller::delete_bulletin,
        crate::modules::bulletins::controller::confirm_bulletin,
        crate::modules::bulletins::controller::download_class_bulletin,
        crate::modules::bulletins::controller::download_student_bulletin,
        crate::modules::attendance::controller::mark_attendance,
        crate::modules::attendance::controller::get_attendance,
        crate::modules::attendance::controller::get_my_attendance,
        crate::modules::attendance::controller::get_attendance_stats,
        crate::modules::attendance::controller::get_student_attendance,
        crate::modules::attendance::controller::get_presence,
        crate::modules::attendance::controller::update_presence,
        crate::modules::attendance::controller::delete_presence,
    ),
    components(
        schemas(
            ErrorResponse,
            Role,
            PaginationMeta,
            PaginationParams,
            LoginRequest,
            LoginResponse,
            User,
            CreateUserDto,
            UpdateUserDto,
            UpdateRoleDto,
            ClassStudents,
            Class,
            ClassWithStats,
            CreateClassDto,
            UpdateClassDto,
            Subject,
            SubjectDetails,
            CreateSubjectDto,
            UpdateSubjectDto,
            Assignment,
            CreateAssignmentDto,
            UpdateAssignmentDto,
            Grade,
            CreateGradeDto,
            UpdateGradeDto,
            Bulletin,
            CreateBulletinDto,
            UpdateBulletinDto,
            ConfirmBulletinResponse,
            AverageResult,
            ClassRanking,
            RankedStudent,
            Student,
            StudentReport,
            GradeEntry,
            BulletinReport,
            BulletinLine,
            SubjectLine,
            ReportFormat,
            Presence,
            AttendanceStatus,
            MarkAttendanceDto,
            UpdateAttendanceDto,
            ClassAttendanceStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and token issuance"),
        (name = "Users", description = "Accounts of every role"),
        (name = "Classes", description = "Classes and their rosters"),
        (name = "Subjects", description = "Subjects and their coefficients"),
        (name = "Assignments", description = "Graded assignments"),
        (name = "Grades", description = "Grades, weighted averages and class rankings"),
        (name = "Bulletins", description = "Term bulletins: confirmation and download"),
        (name = "Attendance", description = "Daily presence marks and per-class counts")
    ),
    info(
        title = "Gradebook API",
        version = "0.1.0",
        description = "School gradebook: grades on a 0 to 20 scale, coefficient-weighted averages, class rankings and term bulletins.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_grading_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/grades/students/{id}/average",
            "/api/grades/classes/{id}/ranking",
            "/api/bulletins/{id}/download",
            "/api/bulletins/{id}/students/{student_id}/download",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_lists_attendance_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance",
            "/api/attendance/mine",
            "/api/attendance/stats",
            "/api/attendance/students/{id}",
            "/api/attendance/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
