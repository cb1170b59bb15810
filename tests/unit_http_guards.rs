//! Requests rejected before any query runs: authentication, capability and
//! body validation failures.

mod common;

use axum::http::StatusCode;
use common::{call, offline_app, random_token};
use gradebook_auth::create_access_token;
use gradebook_config::JwtConfig;
use gradebook_core::Role;
use gradebook_models::{BulletinId, ClassId, UserId};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let (status, body) = call(offline_app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, body) = call(offline_app(), "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Gradebook API");
    assert!(body["paths"]["/api/grades/classes/{id}/ranking"].is_object());
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    for uri in [
        "/api/users/me",
        "/api/classes",
        "/api/grades",
        "/api/bulletins",
    ] {
        let (status, body) = call(offline_app(), "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Missing authorization header");
    }
}

#[tokio::test]
async fn test_non_bearer_header_is_unauthorized() {
    let app = offline_app();
    let request = axum::http::Request::builder()
        .uri("/api/users/me")
        .header("authorization", "Basic YWRtaW46YWRtaW4=")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::json_body(response).await;
    assert_eq!(body["error"], "Invalid authorization header format");
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_unauthorized() {
    let foreign = JwtConfig {
        secret: "some-other-secret".to_string(),
        access_token_expiry: 3600,
    };
    let token = create_access_token(UserId::new().into_inner(), "intrus", Role::Admin, &foreign)
        .unwrap();

    let (status, body) = call(offline_app(), "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_admin_only_routes_reject_other_roles() {
    for role in [Role::Professor, Role::Student, Role::Parent] {
        let token = random_token(role);
        let (status, body) = call(
            offline_app(),
            "POST",
            "/api/classes",
            Some(&token),
            Some(json!({ "name": "6eme A" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "Only administrators can manage classes.");
    }

    let token = random_token(Role::Professor);
    let (status, _) = call(offline_app(), "GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_professors_record_grades() {
    let token = random_token(Role::Admin);
    let (status, body) = call(
        offline_app(),
        "POST",
        "/api/grades",
        Some(&token),
        Some(json!({
            "student_id": UserId::new(),
            "assignment_id": UserId::new(),
            "value": 12.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only professors can record grades.");
}

#[tokio::test]
async fn test_students_and_parents_cannot_view_gradebook() {
    for role in [Role::Student, Role::Parent] {
        let token = random_token(role);
        let uri = format!("/api/grades/classes/{}/ranking", ClassId::new());
        let (status, _) = call(offline_app(), "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");

        let (status, _) = call(offline_app(), "GET", "/api/grades", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn test_class_bulletin_download_is_admin_only() {
    let uri = format!("/api/bulletins/{}/download", BulletinId::new());
    for role in [Role::Professor, Role::Student, Role::Parent] {
        let token = random_token(role);
        let (status, body) = call(offline_app(), "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "Only administrators can download a class bulletin.");
    }
}

#[tokio::test]
async fn test_role_specific_listings() {
    let token = random_token(Role::Student);
    let (status, _) = call(offline_app(), "GET", "/api/users/my-children", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = random_token(Role::Parent);
    let (status, _) = call(offline_app(), "GET", "/api/subjects/mine", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grade_above_twenty_is_unprocessable() {
    let token = random_token(Role::Professor);
    let (status, body) = call(
        offline_app(),
        "POST",
        "/api/grades",
        Some(&token),
        Some(json!({
            "student_id": UserId::new(),
            "assignment_id": UserId::new(),
            "value": 20.5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "A grade must be between 0 and 20.");
}

#[tokio::test]
async fn test_empty_class_name_is_unprocessable() {
    let token = random_token(Role::Admin);
    let (status, body) = call(
        offline_app(),
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "name must be 1 to 100 characters");
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let token = random_token(Role::Admin);
    let (status, body) = call(
        offline_app(),
        "POST",
        "/api/subjects",
        Some(&token),
        Some(json!({ "name": "Mathématiques" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "class_id is required");
}

#[tokio::test]
async fn test_zero_coefficient_is_unprocessable() {
    let token = random_token(Role::Admin);
    let (status, body) = call(
        offline_app(),
        "POST",
        "/api/subjects",
        Some(&token),
        Some(json!({ "name": "EPS", "class_id": ClassId::new(), "coefficient": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "coefficient must be a positive integer");
}

#[tokio::test]
async fn test_students_and_parents_cannot_mark_attendance() {
    for role in [Role::Student, Role::Parent] {
        let token = random_token(role);
        let (status, body) = call(
            offline_app(),
            "POST",
            "/api/attendance",
            Some(&token),
            Some(json!({ "student_id": UserId::new(), "class_id": ClassId::new() })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "Only administrators and professors can mark attendance.");

        let (status, _) = call(offline_app(), "GET", "/api/attendance", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn test_attendance_stats_are_admin_only() {
    for role in [Role::Professor, Role::Student, Role::Parent] {
        let token = random_token(role);
        let (status, body) =
            call(offline_app(), "GET", "/api/attendance/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "Only administrators can view attendance statistics.");
    }
}

#[tokio::test]
async fn test_own_attendance_is_for_students() {
    for role in [Role::Admin, Role::Professor, Role::Parent] {
        let token = random_token(role);
        let (status, body) =
            call(offline_app(), "GET", "/api/attendance/mine", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "Only students can view their own attendance.");
    }
}

#[tokio::test]
async fn test_attendance_stats_reject_inverted_range() {
    let token = random_token(Role::Admin);
    let (status, body) = call(
        offline_app(),
        "GET",
        "/api/attendance/stats?from=2025-03-10&to=2025-03-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "from must not be after to");
}
