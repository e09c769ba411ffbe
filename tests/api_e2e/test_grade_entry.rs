//! E2E tests: grade entry, bulk entry, updates and deletes.

use std::sync::Arc;

use serde_json::json;

use school_records_lib::models::notification::kind;
use school_records_lib::models::{ExamType, Term};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_teacher_records_grade_and_student_is_notified() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let emitter = Arc::new(RecordingEmitter::default());
    let app = create_test_app(&pool, emitter.clone()).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/grades",
        &school.teacher_token(),
        json!({
            "student_id": school.student.id,
            "subject_id": school.math_a.id,
            "term": "term1",
            "exam_type": "midterm",
            "marks": 42.5,
            "max_marks": 50
        }),
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    let data = &body["data"];
    assert_eq!(data["percentage"], 85.0);
    assert_eq!(data["grade"], "A");
    assert_eq!(data["class_id"], school.class_a.id.to_string());
    assert_eq!(data["teacher_id"], school.teacher.teacher_id.to_string());

    let events = emitter.events_for(school.student_user.id);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, kind::GRADE_POSTED);

    // The notification is also persisted for the student
    let (status, body) = get_json(&app, "/api/v1/notifications", &school.student_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
}

#[actix_rt::test]
async fn test_marks_validation() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    for (marks, max_marks) in [(51.0, 50.0), (-1.0, 50.0), (10.0, 0.0)] {
        let (status, body) = post_json(
            &app,
            "/api/v1/grades",
            &school.teacher_token(),
            json!({
                "student_id": school.student.id,
                "subject_id": school.math_a.id,
                "term": "term1",
                "exam_type": "assignment",
                "marks": marks,
                "max_marks": max_marks
            }),
        )
        .await;
        assert_eq!(status, 400, "{} / {}: {}", marks, max_marks, body);
        assert_eq!(body["success"], false);
    }

    // Without an exam, term is required
    let (status, _) = post_json(
        &app,
        "/api/v1/grades",
        &school.teacher_token(),
        json!({
            "student_id": school.student.id,
            "subject_id": school.math_a.id,
            "exam_type": "assignment",
            "marks": 5,
            "max_marks": 10
        }),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_unknown_fields_rejected() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/grades",
        &school.teacher_token(),
        json!({
            "student_id": school.student.id,
            "subject_id": school.math_a.id,
            "term": "term1",
            "exam_type": "assignment",
            "marks": 5,
            "max_marks": 10,
            "percentage": 100
        }),
    )
    .await;
    assert_eq!(status, 400, "{}", body);
}

#[actix_rt::test]
async fn test_teacher_scope_on_entry() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    // Student of class B, subject of class A
    let (status, _) = post_json(
        &app,
        "/api/v1/grades",
        &school.teacher_token(),
        json!({
            "student_id": school.student_b.id,
            "subject_id": school.math_a.id,
            "term": "term1",
            "exam_type": "assignment",
            "marks": 5,
            "max_marks": 10
        }),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = post_json(
        &app,
        "/api/v1/grades",
        &school.student_token(),
        json!({
            "student_id": school.student.id,
            "subject_id": school.math_a.id,
            "term": "term1",
            "exam_type": "assignment",
            "marks": 10,
            "max_marks": 10
        }),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_exam_supplies_defaults() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let exam = seed_exam(
        &pool,
        "Final exam",
        &school.math_a,
        Term::Final,
        ExamType::Final,
        80.0,
        true,
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/grades",
        &school.teacher_token(),
        json!({
            "student_id": school.student.id,
            "subject_id": school.math_a.id,
            "exam_id": exam.id,
            "marks": 60
        }),
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["term"], "final");
    assert_eq!(body["data"]["exam_type"], "final");
    assert_eq!(body["data"]["max_marks"], 80.0);
    assert_eq!(body["data"]["percentage"], 75.0);
    assert_eq!(body["data"]["grade"], "B");

    // Exam from another subject
    let (status, _) = post_json(
        &app,
        "/api/v1/grades",
        &school.admin_token(),
        json!({
            "student_id": school.student.id,
            "subject_id": school.science_a.id,
            "exam_id": exam.id,
            "marks": 60
        }),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_bulk_reports_failures_inline() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let emitter = Arc::new(RecordingEmitter::default());
    let app = create_test_app(&pool, emitter.clone()).await;

    let item = |student_id: uuid::Uuid, marks: f64| {
        json!({
            "student_id": student_id,
            "subject_id": school.math_a.id,
            "term": "term2",
            "exam_type": "assignment",
            "marks": marks,
            "max_marks": 20
        })
    };

    let (status, body) = post_json(
        &app,
        "/api/v1/grades/bulk",
        &school.teacher_token(),
        json!({
            "grades": [
                item(school.student.id, 18.0),
                item(school.classmate.id, 25.0),
                item(school.student_c.id, 10.0),
                item(school.classmate.id, 11.0)
            ]
        }),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["success"], false);
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["failed"], 2);
    assert_eq!(body["errors"][0]["index"], 1);
    assert_eq!(body["errors"][1]["index"], 2);
    assert_eq!(body["data"][0]["percentage"], 90.0);
    assert_eq!(body["data"][1]["percentage"], 55.0);

    assert_eq!(emitter.events_for(school.student_user.id).len(), 1);
    assert_eq!(emitter.events_for(school.classmate_user.id).len(), 1);
    assert!(emitter.events_for(school.student_c_user.id).is_empty());

    let (status, _) = post_json(
        &app,
        "/api/v1/grades/bulk",
        &school.teacher_token(),
        json!({ "grades": [] }),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_update_recomputes_and_rejects_unknown_fields() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let emitter = Arc::new(RecordingEmitter::default());
    let app = create_test_app(&pool, emitter.clone()).await;

    let grade = seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 10.0, 20.0, None).await;
    assert_eq!(grade.grade, "D");
    let uri = format!("/api/v1/grades/{}", grade.id);

    let (status, body) = put_json(&app, &uri, &school.teacher_token(), json!({ "marks": 17 })).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["percentage"], 85.0);
    assert_eq!(body["data"]["grade"], "A");
    assert_eq!(body["data"]["max_marks"], 20.0);

    let events = emitter.events_for(school.student_user.id);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, kind::GRADE_UPDATED);

    let (status, _) = put_json(
        &app,
        &uri,
        &school.teacher_token(),
        json!({ "marks": 15, "student_id": school.classmate.id }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = put_json(&app, &uri, &school.teacher_token(), json!({})).await;
    assert_eq!(status, 400);

    // Would exceed max_marks
    let (status, _) = put_json(&app, &uri, &school.teacher_token(), json!({ "max_marks": 10 })).await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_delete_grade() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let grade = seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 10.0, 20.0, None).await;
    let other = seed_grade(&pool, &school.student, &school.science_a, Term::Term1, 10.0, 20.0, None).await;

    // Science is not the teacher's subject
    let status = delete(&app, &format!("/api/v1/grades/{}", other.id), &school.teacher_token()).await;
    assert_eq!(status, 403);

    let uri = format!("/api/v1/grades/{}", grade.id);
    assert_eq!(delete(&app, &uri, &school.teacher_token()).await, 204);
    assert_eq!(delete(&app, &uri, &school.teacher_token()).await, 404);

    let (status, body) = get_json(
        &app,
        &format!("/api/v1/grades/student/{}", school.student.id),
        &school.student_token(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}
