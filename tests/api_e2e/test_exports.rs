//! E2E tests: exam result lists and CSV downloads.

use std::sync::Arc;

use school_records_lib::models::{CreateStudentRequest, ExamType, Role, Term};

use super::test_helpers::*;

const EXAM_HEADER: &str =
    "Student Name,Student Email,Student ID,Class,Exam Title,Score,Total,Percentage,Submitted At";

#[actix_rt::test]
async fn test_exam_results_json() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let exam = seed_exam(&pool, "Unit test 1", &school.math_a, Term::Term1, ExamType::Midterm, 40.0, true).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 34.0, 40.0, Some(&exam)).await;
    seed_grade(&pool, &school.classmate, &school.math_a, Term::Term1, 12.0, 40.0, Some(&exam)).await;
    // Same subject, no exam: not part of the list
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 5.0, 10.0, None).await;

    let uri = format!("/api/v1/exams/{}/results", exam.id);
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);

    let rows = body["data"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["student_name"], "Ada Lovelace");
    assert_eq!(rows[0]["student_id"], "A-01");
    assert_eq!(rows[0]["class_name"], "Grade 7 A");
    assert_eq!(rows[0]["exam_title"], "Unit test 1");
    assert_eq!(rows[0]["percentage"], 85.0);
    assert_eq!(rows[0]["grade"], "A");
    assert_eq!(rows[1]["student_id"], "A-02");
    assert_eq!(rows[1]["grade"], "F");
}

#[actix_rt::test]
async fn test_exam_results_csv_quotes_fields() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let user = seed_user(&pool, "Pat \"Ace\" O'Brien, Jr", Role::Student).await;
    let student = pool
        .insert_student(&CreateStudentRequest {
            user_id: user.id,
            class_id: school.class_a.id,
            roll_number: "A-03".to_string(),
            parent_name: None,
            parent_phone: None,
        })
        .await
        .expect("seed student");

    let exam = seed_exam(&pool, "Quiz, week 2", &school.math_a, Term::Term2, ExamType::Assignment, 20.0, false).await;
    seed_grade(&pool, &student, &school.math_a, Term::Term2, 15.0, 20.0, Some(&exam)).await;

    let uri = format!("/api/v1/exams/{}/results?format=csv", exam.id);
    let (status, body, content_type) = get_text(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 200);
    assert!(content_type.starts_with("text/csv"), "{}", content_type);

    let mut lines = body.lines();
    assert_eq!(lines.next(), Some(EXAM_HEADER));
    let row = lines.next().expect("one data row");
    assert!(
        row.starts_with("\"Pat \"\"Ace\"\" O'Brien, Jr\","),
        "unexpected row: {}",
        row
    );
    assert!(row.contains(",A-03,Grade 7 A,\"Quiz, week 2\",15,20,75,"), "{}", row);
    assert_eq!(lines.next(), None);
}

#[actix_rt::test]
async fn test_exam_results_scope() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let exam = seed_exam(&pool, "Lab report", &school.science_a, Term::Term1, ExamType::Assignment, 10.0, true).await;
    let uri = format!("/api/v1/exams/{}/results", exam.id);

    let (status, _) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 403);
    let (status, _) = get_json(&app, &uri, &school.student_token()).await;
    assert_eq!(status, 403);

    let (status, body) = get_json(
        &app,
        &format!("/api/v1/exams/{}/results", uuid::Uuid::new_v4()),
        &school.admin_token(),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Exam not found");

    // Empty CSV still carries the header
    let (status, body, _) = get_text(&app, &format!("{}?format=csv", uri), &school.admin_token()).await;
    assert_eq!(status, 200);
    assert_eq!(body, format!("{}\n", EXAM_HEADER));
}

#[actix_rt::test]
async fn test_academic_result_csv() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let exam = seed_exam(&pool, "Midterm", &school.math_a, Term::Term1, ExamType::Midterm, 50.0, true).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 45.0, 50.0, Some(&exam)).await;
    seed_grade(&pool, &school.student, &school.science_a, Term::Term2, 6.0, 10.0, None).await;

    let uri = format!(
        "/api/v1/grades/academic-result/{}?format=csv",
        school.student.id
    );
    let (status, body, content_type) = get_text(&app, &uri, &school.student_token()).await;
    assert_eq!(status, 200);
    assert!(content_type.starts_with("text/csv"));

    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Subject,Subject Code,Term,Exam,Exam Type,Marks,Max Marks,Percentage,Grade",
            "Mathematics,MATH-7A,term1,Midterm,assignment,45,50,90,A",
            "Science,SCI-7A,term2,,assignment,6,10,60,C",
        ]
    );

    // Format values outside json/csv are rejected
    let (status, _) = get_json(
        &app,
        &format!("/api/v1/grades/academic-result/{}?format=xml", school.student.id),
        &school.student_token(),
    )
    .await;
    assert_eq!(status, 400);
}
