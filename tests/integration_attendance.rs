//! Attendance marking, scoped reads and per-class counts against Postgres.

mod common;

use axum::http::StatusCode;
use common::{app, call, insert_class, insert_subject, insert_user, token_for};
use gradebook_core::Role;
use gradebook_models::{ClassId, UserId};
use serde_json::{Value, json};
use sqlx::PgPool;

struct Roll {
    class_id: ClassId,
    other_class: ClassId,
    admin: String,
    professor: String,
    outside_professor: String,
    awa: UserId,
    binta: UserId,
    parent: String,
}

async fn roll(pool: &PgPool) -> Roll {
    let class_id = insert_class(pool, "6eme A").await;
    let other_class = insert_class(pool, "5eme B").await;

    let admin_id = insert_user(pool, "admin", Role::Admin, None, None).await;
    let professor_id = insert_user(pool, "prof", Role::Professor, None, None).await;
    let outside_id = insert_user(pool, "ailleurs", Role::Professor, None, None).await;
    let parent_id = insert_user(pool, "parent", Role::Parent, None, None).await;
    let awa = insert_user(pool, "awa", Role::Student, Some(class_id), Some(parent_id)).await;
    let binta = insert_user(pool, "binta", Role::Student, Some(class_id), None).await;

    insert_subject(pool, "Maths", class_id, Some(professor_id), 2).await;
    insert_subject(pool, "Histoire", other_class, Some(outside_id), 1).await;

    Roll {
        class_id,
        other_class,
        admin: token_for(admin_id, Role::Admin),
        professor: token_for(professor_id, Role::Professor),
        outside_professor: token_for(outside_id, Role::Professor),
        awa,
        binta,
        parent: token_for(parent_id, Role::Parent),
    }
}

async fn mark(pool: &PgPool, token: &str, body: Value) -> (StatusCode, Value) {
    call(app(pool.clone()), "POST", "/api/attendance", Some(token), Some(body)).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_attendance_rules(pool: PgPool) {
    let r = roll(&pool).await;

    let (status, presence) = mark(
        &pool,
        &r.professor,
        json!({ "student_id": r.awa, "class_id": r.class_id, "date": "2025-03-14" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(presence["status"], "present");
    assert_eq!(presence["date"], "2025-03-14");

    let (status, body) = mark(
        &pool,
        &r.professor,
        json!({ "student_id": r.awa, "class_id": r.class_id, "date": "2025-03-14", "status": "late" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Attendance is already marked for this student on this date");

    let (status, body) = mark(
        &pool,
        &r.outside_professor,
        json!({ "student_id": r.binta, "class_id": r.class_id }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You do not teach this class.");

    let (status, body) = mark(
        &pool,
        &r.admin,
        json!({ "student_id": r.binta, "class_id": r.other_class }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The student does not belong to this class");

    let (status, body) = mark(
        &pool,
        &r.admin,
        json!({ "student_id": UserId::new(), "class_id": r.class_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The attendance's student must have the student role");

    let (status, body) = mark(
        &pool,
        &r.admin,
        json!({ "student_id": r.binta, "class_id": r.class_id, "status": "absent" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "absent");
    assert!(body["date"].is_string());

    let uri = format!("/api/attendance/{}", presence["id"].as_str().unwrap());
    let (status, body) = call(
        app(pool.clone()),
        "PUT",
        &uri,
        Some(&r.outside_professor),
        Some(json!({ "status": "absent" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You do not teach this class.");

    let (status, body) = call(
        app(pool.clone()),
        "PUT",
        &uri,
        Some(&r.professor),
        Some(json!({ "status": "late" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "late");

    let (status, _) = call(app(pool.clone()), "DELETE", &uri, Some(&r.professor), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(app(pool), "GET", &uri, Some(&r.admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_attendance_reads_are_scoped(pool: PgPool) {
    let r = roll(&pool).await;
    let (_, awa_mark) = mark(
        &pool,
        &r.professor,
        json!({ "student_id": r.awa, "class_id": r.class_id, "status": "late" }),
    )
    .await;
    mark(
        &pool,
        &r.professor,
        json!({ "student_id": r.binta, "class_id": r.class_id }),
    )
    .await;

    let awa = token_for(r.awa, Role::Student);
    let binta = token_for(r.binta, Role::Student);

    let (status, mine) = call(app(pool.clone()), "GET", "/api/attendance/mine", Some(&awa), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["status"], "late");

    let awa_uri = format!("/api/attendance/students/{}", r.awa);
    let (status, _) = call(app(pool.clone()), "GET", &awa_uri, Some(&r.parent), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(app(pool.clone()), "GET", &awa_uri, Some(&binta), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let binta_uri = format!("/api/attendance/students/{}", r.binta);
    let (status, _) = call(app(pool.clone()), "GET", &binta_uri, Some(&r.parent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mark_uri = format!("/api/attendance/{}", awa_mark["id"].as_str().unwrap());
    let (status, _) = call(app(pool.clone()), "GET", &mark_uri, Some(&awa), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(app(pool.clone()), "GET", &mark_uri, Some(&binta), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, page) = call(
        app(pool),
        "GET",
        &format!("/api/attendance?class_id={}&status=late", r.class_id),
        Some(&r.professor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_class_attendance_stats(pool: PgPool) {
    let r = roll(&pool).await;
    for (student, date, status) in [
        (r.awa, "2025-03-10", "present"),
        (r.awa, "2025-03-11", "late"),
        (r.binta, "2025-03-10", "absent"),
        (r.binta, "2025-03-20", "present"),
    ] {
        let (code, _) = mark(
            &pool,
            &r.admin,
            json!({ "student_id": student, "class_id": r.class_id, "date": date, "status": status }),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, stats) = call(app(pool.clone()), "GET", "/api/attendance/stats", Some(&r.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = stats.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    // Ordered by class name.
    assert_eq!(stats[0]["class_name"], "5eme B");
    assert_eq!(stats[0]["total"], 0);
    assert_eq!(stats[1]["class_name"], "6eme A");
    assert_eq!(stats[1]["total"], 4);
    assert_eq!(stats[1]["present"], 2);
    assert_eq!(stats[1]["absent"], 1);
    assert_eq!(stats[1]["late"], 1);

    let (status, stats) = call(
        app(pool),
        "GET",
        "/api/attendance/stats?from=2025-03-10&to=2025-03-11",
        Some(&r.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats[1]["total"], 3);
    assert_eq!(stats[1]["present"], 1);
}
