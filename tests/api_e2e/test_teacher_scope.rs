//! E2E tests: teacher subject/class view, its statistics and analytics.

use std::sync::Arc;

use school_records_lib::models::{Role, Term};

use super::test_helpers::*;

fn view_uri(subject_id: uuid::Uuid, class_id: uuid::Uuid) -> String {
    format!(
        "/api/v1/grades/teacher/subject/{}/class/{}",
        subject_id, class_id
    )
}

#[actix_rt::test]
async fn test_assigned_pair_allowed() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 30.0, 100.0, None).await;
    seed_grade(&pool, &school.classmate, &school.math_a, Term::Term1, 40.0, 100.0, None).await;
    seed_grade(&pool, &school.classmate, &school.math_a, Term::Term2, 90.0, 100.0, None).await;

    let uri = view_uri(school.math_a.id, school.class_a.id);
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    assert_eq!(body["pagination"]["total"], 3);

    let summary = &body["summary"];
    assert_eq!(summary["scope"], "page");
    assert_eq!(summary["count"], 3);
    assert_eq!(summary["pass_threshold"], 40.0);
    // 40% is a pass
    assert_eq!(summary["pass_count"], 2);
    assert_eq!(summary["fail_count"], 1);
    assert_eq!(summary["pass_rate"], 66.67);
    assert_eq!(summary["highest_percentage"], 90.0);
    assert_eq!(summary["lowest_percentage"], 30.0);
    assert_eq!(summary["grade_distribution"]["A"], 1);
    assert_eq!(summary["grade_distribution"]["D"], 1);
    assert_eq!(summary["grade_distribution"]["F"], 1);
    assert_eq!(summary["by_term"][0]["key"], "term1");
    assert_eq!(summary["by_term"][0]["count"], 2);
    assert_eq!(summary["by_term"][1]["key"], "term2");

    // Classmate averages 65%, student 30%
    let leaderboard = &summary["leaderboard"];
    assert_eq!(leaderboard[0]["rank"], 1);
    assert_eq!(leaderboard[0]["roll_number"], "A-02");
    assert_eq!(leaderboard[0]["average_percentage"], 65.0);
    assert_eq!(leaderboard[1]["roll_number"], "A-01");

    // Rows carry the student
    assert!(body["data"][0]["student"]["name"].is_string());
}

#[actix_rt::test]
async fn test_subject_from_other_class_forbidden() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    // Assigned to math_a and class B, but math_a belongs to class A
    let uri = view_uri(school.math_a.id, school.class_b.id);
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 403, "{}", body);
    assert_eq!(body["success"], false);

    // Class B's own Mathematics is not in the teacher's subject set
    let uri = view_uri(school.math_b.id, school.class_b.id);
    let (status, _) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 403);

    let uri = view_uri(school.science_a.id, school.class_a.id);
    let (status, _) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_admin_mismatch_and_student_refused() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let uri = view_uri(school.math_a.id, school.class_b.id);
    let (status, _) = get_json(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 400);

    let uri = view_uri(school.math_a.id, school.class_a.id);
    let (status, _) = get_json(&app, &uri, &school.admin_token()).await;
    assert_eq!(status, 200);

    let (status, _) = get_json(&app, &uri, &school.student_token()).await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_teacher_without_profile() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let newcomer = seed_user(&pool, "New Teacher", Role::Teacher).await;
    let uri = view_uri(school.math_a.id, school.class_a.id);
    let (status, body) = get_json(&app, &uri, &token_for(newcomer.id, Role::Teacher)).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Teacher profile not found");
}

#[actix_rt::test]
async fn test_page_and_filtered_summaries() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    for marks in [10.0, 20.0, 30.0, 40.0, 50.0] {
        seed_grade(&pool, &school.student, &school.math_a, Term::Term1, marks, 50.0, None).await;
    }

    let base = view_uri(school.math_a.id, school.class_a.id);

    let uri = format!("{}?page=1&limit=2&sort=-percentage", base);
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["data"][0]["percentage"], 100.0);
    assert_eq!(body["data"][1]["percentage"], 80.0);
    assert_eq!(body["summary"]["scope"], "page");
    assert_eq!(body["summary"]["count"], 2);
    assert_eq!(body["summary"]["average_percentage"], 90.0);

    let uri = format!("{}?page=1&limit=2&sort=-percentage&summary_scope=filtered", base);
    let (_, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["summary"]["scope"], "filtered");
    assert_eq!(body["summary"]["count"], 5);
    assert_eq!(body["summary"]["average_percentage"], 60.0);
}

#[actix_rt::test]
async fn test_term_path_variant() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 10.0, 20.0, None).await;
    seed_grade(&pool, &school.student, &school.math_a, Term::Final, 18.0, 20.0, None).await;

    let uri = format!(
        "{}/term/final",
        view_uri(school.math_a.id, school.class_a.id)
    );
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["term"], "final");

    let uri = format!(
        "{}/term/summer",
        view_uri(school.math_a.id, school.class_a.id)
    );
    let (status, _) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_sort_by_term_follows_school_year() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    for term in [Term::Term2, Term::Final, Term::Term1] {
        seed_grade(&pool, &school.student, &school.math_a, term, 5.0, 10.0, None).await;
    }
    let base = view_uri(school.math_a.id, school.class_a.id);

    let terms = |body: &serde_json::Value| -> Vec<String> {
        body["data"]
            .as_array()
            .expect("rows")
            .iter()
            .filter_map(|g| g["term"].as_str().map(str::to_string))
            .collect()
    };

    let (status, body) = get_json(&app, &format!("{}?sort=term", base), &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(terms(&body), vec!["term1", "term2", "final"]);

    let (status, body) = get_json(&app, &format!("{}?sort=-term", base), &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(terms(&body), vec!["final", "term2", "term1"]);
}

#[actix_rt::test]
async fn test_unknown_sort_field_rejected() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    let uri = format!(
        "{}?sort=-password",
        view_uri(school.math_a.id, school.class_a.id)
    );
    let (status, body) = get_json(&app, &uri, &school.teacher_token()).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn test_analytics_grouped_by_day_and_month() {
    let pool = create_test_pool().await;
    let school = seed_school(&pool).await;
    let app = create_test_app(&pool, Arc::new(RecordingEmitter::default())).await;

    seed_grade(&pool, &school.student, &school.math_a, Term::Term1, 20.0, 40.0, None).await;
    seed_grade(&pool, &school.classmate, &school.math_a, Term::Term1, 40.0, 40.0, None).await;
    // Outside the teacher's subject set
    seed_grade(&pool, &school.student, &school.science_a, Term::Term1, 0.0, 40.0, None).await;

    let (status, body) = get_json(&app, "/api/v1/grades/analytics", &school.teacher_token()).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["granularity"], "day");
    let bucket = &body["data"][0];
    assert_eq!(bucket["count"], 2);
    assert_eq!(bucket["average_percentage"], 75.0);
    assert_eq!(bucket["min_percentage"], 50.0);
    assert_eq!(bucket["max_percentage"], 100.0);
    assert_eq!(bucket["period"].as_str().map(str::len), Some(10));

    let (status, body) = get_json(
        &app,
        "/api/v1/grades/analytics?granularity=month",
        &school.admin_token(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["count"], 3);
    assert_eq!(body["data"][0]["period"].as_str().map(str::len), Some(7));

    let (status, _) =
        get_json(&app, "/api/v1/grades/analytics", &school.student_token()).await;
    assert_eq!(status, 403);
}
