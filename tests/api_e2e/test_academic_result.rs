//! E2E tests: aggregated academic result sheet.

use std::sync::Arc;

use school_records_lib::models::{ExamType, Term};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_subject_overall_is_mark_weighted() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    // 5/10 (50%) and 45/50 (90%): weighted 50/60, not the 70% mean
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 5.0, 10.0, None).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Term2, 45.0, 50.0, None).await;

    let uri = format!("/api/v1/grades/academic-result/{}", school.student.id);
    let (status, body) = get_json(&app, &uri, &school.student_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["student"]["roll_number"], "A-01");
    assert_eq!(data["student"]["class_name"], "Grade 7 A");

    let subject = &data["subjects"][0];
    assert_eq!(subject["subject_code"], "MATH-7A");
    assert_eq!(subject["terms"][0]["term"], "term1");
    assert_eq!(subject["terms"][0]["totals"]["percentage"], 50.0);
    assert_eq!(subject["terms"][1]["term"], "term2");
    assert_eq!(subject["terms"][1]["totals"]["percentage"], 90.0);
    assert_eq!(subject["overall"]["total_marks"], 50.0);
    assert_eq!(subject["overall"]["total_max_marks"], 60.0);
    assert_eq!(subject["overall"]["percentage"], 83.33);
    assert_eq!(subject["overall"]["grade"], "B");

    assert_eq!(data["summary"]["total_subjects"], 1);
    assert_eq!(data["summary"]["overall_percentage"], 83.33);
    assert_eq!(data["summary"]["overall_grade"], "B");
    assert_eq!(data["summary"]["remarks"], "Very good performance.");
}

#[actix_rt::test]
async fn test_empty_grade_set() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let uri = format!("/api/v1/grades/academic-result/{}", school.student.id);
    let (status, body) = get_json(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 200, "{}", body);

    let summary = &body["data"]["summary"];
    assert_eq!(summary["total_subjects"], 0);
    assert_eq!(summary["overall_percentage"], 0.0);
    assert_eq!(summary["overall_grade"], "F");
    assert_eq!(body["data"]["subjects"].as_array().map(Vec::len), Some(0));
}

#[actix_rt::test]
async fn test_term_filter_and_subject_order() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    seed_grade(&pool, &school.student, &school.science_a, Term::Term1, 30.0, 40.0, None).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 17.0, 20.0, None).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Final, 90.0, 100.0, None).await;

    let uri = format!(
        "/api/v1/grades/academic-result/{}?term=term1",
        school.student.id
    );
    let (status, body) = get_json(&app, &uri, &school.student_token()).await;
    assert_eq!(status, 200, "{}", body);

    let data = &body["data"];
    assert_eq!(data["term"], "term1");
    // First-seen order: Science was graded first
    assert_eq!(data["subjects"][0]["subject_code"], "SCI-7A");
    assert_eq!(data["subjects"][1]["subject_code"], "MATH-7A");
    assert_eq!(data["subjects"][1]["terms"].as_array().map(Vec::len), Some(1));
    // 47/60
    assert_eq!(data["summary"]["overall_percentage"], 78.33);
    assert_eq!(data["summary"]["overall_grade"], "B");
}

#[actix_rt::test]
async fn test_unpublished_exam_hidden_from_student() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let draft = seed_exam(
        &pool,
        "Unit test 2",
        &school.math_a,
        Term::Term1,
        ExamType::Midterm,
        50.0,
        false,
    )
    .await;
    let published = seed_exam(
        &pool,
        "Unit test 1",
        &school.math_a,
        Term::Term1,
        ExamType::Midterm,
        50.0,
        true,
    )
    .await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 40.0, 50.0, Some(&published)).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 10.0, 50.0, Some(&draft)).await;

    let uri = format!("/api/v1/grades/academic-result/{}", school.student.id);

    let (_, body) = get_json(&app, &uri, &school.student_token()).await;
    let exams = &body["data"]["subjects"][0]["terms"][0]["exams"];
    assert_eq!(exams.as_array().map(Vec::len), Some(1));
    assert_eq!(exams[0]["exam_title"], "Unit test 1");
    assert_eq!(body["data"]["summary"]["overall_percentage"], 80.0);

    let (_, body) = get_json(&app, &uri, &school.admin_token()).await;
    let exams = &body["data"]["subjects"][0]["terms"][0]["exams"];
    assert_eq!(exams.as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["summary"]["overall_percentage"], 50.0);
}

#[actix_rt::test]
async fn test_student_cannot_read_classmate() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let uri = format!("/api/v1/grades/academic-result/{}", school.classmate.id);
    let (status, body) = get_json(&app, &uri, &school.student_token()).await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());
}

#[actix_rt::test]
async fn test_teacher_scope_on_result_sheet() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    // Assigned class
    let uri = format!("/api/v1/grades/academic-result/{}", school.student_b.id);
    let (status, _) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 200);

    // Unassigned class
    let uri = format!("/api/v1/grades/academic-result/{}", school.student_c.id);
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 403, "{}", body);
}

#[actix_rt::test]
async fn test_unknown_student_and_class() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let uri = format!("/api/v1/grades/academic-result/{}", uuid::Uuid::new_v4());
    let (status, body) = get_json(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Student not found");

    let uri = format!(
        "/api/v1/grades/academic-result/{}?class_id={}",
        school.student.id,
        uuid::Uuid::new_v4()
    );
    let (status, body) = get_json(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Class not found");
}

#[actix_rt::test]
async fn test_missing_student_profile() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let orphan = seed_user(&pool, "No Profile", school_records_lib::models::Role::Student).await;
    let token = token_for(orphan.id, school_records_lib::models::Role::Student);

    let uri = format!("/api/v1/grades/academic-result/{}", school.student.id);
    let (status, body) = get_json(&app, &uri, &token).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Student profile not found");
}

#[actix_rt::test]
async fn test_missing_token_rejected() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let req = actix_web::test::TestRequest::get()
        .uri(&format!("/api/v1/grades/academic-result/{}", school.student.id))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}
