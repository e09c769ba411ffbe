//! E2E tests: users, classes, subjects, teacher and student profiles.

use std::sync::Arc;

use serde_json::json;

use school_records_lib::models::Role;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_users_me_and_create() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let (status, body) = get_json(&app, "/api/v1/users/me", &school.teacher_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Maya Teacher");
    assert_eq!(body["data"]["role"], "teacher");

    let (status, body) = post_json(
        &app,
        "/api/v1/users",
        &school.admin_token(),
        json!({ "name": "Linus", "email": "Linus@School.test", "role": "student" }),
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["email"], "linus@school.test");

    // Emails are unique regardless of case
    let (status, _) = post_json(
        &app,
        "/api/v1/users",
        &school.admin_token(),
        json!({ "name": "Linus 2", "email": "LINUS@school.test", "role": "student" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = post_json(
        &app,
        "/api/v1/users",
        &school.teacher_token(),
        json!({ "name": "X", "email": "x@school.test", "role": "admin" }),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = post_json(
        &app,
        "/api/v1/users",
        &school.admin_token(),
        json!({ "name": "X", "email": "x@school.test", "role": "janitor" }),
    )
    .await;
    assert_eq!(status, 400);

    // Valid token for a user that does not exist
    let ghost = token_for(uuid::Uuid::new_v4(), Role::Admin);
    let (status, _) = get_json(&app, "/api/v1/users/me", &ghost).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_class_and_subject_scoping() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let (status, body) = get_json(&app, "/api/v1/classes", &school.admin_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));

    let (status, body) = get_json(&app, "/api/v1/classes", &school.teacher_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = get_json(&app, "/api/v1/classes", &school.student_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["name"], "Grade 7 A");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let uri = format!("/api/v1/classes/{}", school.class_c.id);
    let (status, _) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 403);
    let (status, _) = get_json(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 200);

    // A teacher only sees assigned subjects
    let (status, body) = get_json(&app, "/api/v1/subjects", &school.teacher_token()).await;
    assert_eq!(status, 200);
    let subjects = body["data"].as_array().expect("subjects");
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["code"], "MATH-7A");

    let (status, body) = get_json(
        &app,
        &format!("/api/v1/subjects?class_id={}", school.class_a.id),
        &school.student_token(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = post_json(
        &app,
        "/api/v1/subjects",
        &school.admin_token(),
        json!({ "name": "History", "code": "HIS-7A", "class_id": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Class not found");

    let (status, _) = post_json(
        &app,
        "/api/v1/classes",
        &school.teacher_token(),
        json!({ "name": "Grade 9 D" }),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_student_listing_scope() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let (status, body) = get_json(&app, "/api/v1/students", &school.teacher_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 3);
    let rolls: Vec<&str> = body["data"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["roll_number"].as_str())
        .collect();
    assert_eq!(rolls, vec!["A-01", "A-02", "B-01"]);

    let (status, _) = get_json(
        &app,
        &format!("/api/v1/students?class_id={}", school.class_c.id),
        &school.teacher_token(),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = get_json(
        &app,
        "/api/v1/students?page=2&limit=3",
        &school.admin_token(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    assert_eq!(body["pagination"]["total_pages"], 2);

    let (status, _) = get_json(&app, "/api/v1/students", &school.student_token()).await;
    assert_eq!(status, 403);

    // Students may read their own profile only
    let (status, body) = get_json(
        &app,
        &format!("/api/v1/students/{}", school.student.id),
        &school.student_token(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    let (status, _) = get_json(
        &app,
        &format!("/api/v1/students/{}", school.classmate.id),
        &school.student_token(),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_profile_creation_rules() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let new_teacher = seed_user(&pool, "Niklaus Wirth", Role::Teacher).await;
    let new_student = seed_user(&pool, "Barbara Liskov", Role::Student).await;

    // Wrong role for the profile
    let (status, _) = post_json(
        &app,
        "/api/v1/teachers",
        &school.admin_token(),
        json!({ "user_id": new_student.id }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = post_json(
        &app,
        "/api/v1/teachers",
        &school.admin_token(),
        json!({ "user_id": new_teacher.id, "subject_ids": [uuid::Uuid::new_v4()] }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Subject not found");

    let (status, body) = post_json(
        &app,
        "/api/v1/teachers",
        &school.admin_token(),
        json!({
            "user_id": new_teacher.id,
            "subject_ids": [school.science_a.id],
            "class_ids": [school.class_a.id]
        }),
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["name"], "Niklaus Wirth");
    assert_eq!(body["data"]["subject_ids"][0], school.science_a.id.to_string());

    let (status, _) = post_json(
        &app,
        "/api/v1/teachers",
        &school.admin_token(),
        json!({ "user_id": new_teacher.id }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = post_json(
        &app,
        "/api/v1/students",
        &school.admin_token(),
        json!({ "user_id": new_student.id, "class_id": school.class_b.id, "roll_number": "B-02" }),
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["class_id"], school.class_b.id.to_string());

    let (status, _) = post_json(
        &app,
        "/api/v1/students",
        &school.admin_token(),
        json!({ "user_id": new_student.id, "class_id": school.class_b.id, "roll_number": "B-03" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = post_json(
        &app,
        "/api/v1/students",
        &school.admin_token(),
        json!({ "user_id": new_teacher.id, "class_id": school.class_b.id, "roll_number": "B-04" }),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_replace_teacher_assignments() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let (status, body) = get_json(&app, "/api/v1/teachers/me", &school.teacher_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["class_ids"].as_array().map(Vec::len), Some(2));

    let uri = format!("/api/v1/teachers/{}/assignments", school.teacher.teacher_id);
    let (status, body) = put_json(
        &app,
        &uri,
        &school.admin_token(),
        json!({ "subject_ids": [school.math_b.id], "class_ids": [school.class_b.id] }),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["subject_ids"], json!([school.math_b.id]));
    assert_eq!(body["data"]["class_ids"], json!([school.class_b.id]));

    // The new assignments take effect immediately
    let (status, _) = get_json(
        &app,
        &format!("/api/v1/classes/{}", school.class_a.id),
        &school.teacher_token(),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = put_json(
        &app,
        &uri,
        &school.teacher_token(),
        json!({ "subject_ids": [], "class_ids": [] }),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = put_json(
        &app,
        &format!("/api/v1/teachers/{}/assignments", uuid::Uuid::new_v4()),
        &school.admin_token(),
        json!({ "subject_ids": [], "class_ids": [] }),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_health_and_readiness() {
    let pool = create_test_pool().await;
    assert_eq!(pool.backend(), sea_orm::DatabaseBackend::Sqlite);
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let (status, body) = get_json(&app, "/api/v1/health", "").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get_json(&app, "/api/v1/ready", "").await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
}
