//! Shared test helpers: database, fixtures, tokens and request shortcuts.

use std::sync::{Arc, Mutex};

use actix_web::{App, dev::ServiceResponse, test, web};
use sea_orm::{ConnectOptions, Database};
use secrecy::SecretString;
use serde_json::Value;
use uuid::Uuid;

use school_records_lib::api;
use school_records_lib::auth::SessionKeys;
use school_records_lib::db::{DbPool, NewGrade, TeacherAssignment};
use school_records_lib::entity::{class, exam, grade, student, subject, user};
use school_records_lib::models::{
    CreateClassRequest, CreateExamRequest, CreateStudentRequest, CreateSubjectRequest, ExamType,
    NotificationEvent, Role, Term,
};
use school_records_lib::services::NotificationEmitter;

/// Session secret shared by the app under test and the token helper.
pub const TEST_SESSION_SECRET: &str = "api-e2e-session-secret";

/// Emitter that records every event instead of pushing it.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<(Uuid, NotificationEvent)>>,
}

impl RecordingEmitter {
    pub fn events_for(&self, user_id: Uuid) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl NotificationEmitter for RecordingEmitter {
    fn emit_to_user(&self, user_id: Uuid, event: NotificationEvent) -> usize {
        self.events.lock().unwrap().push((user_id, event));
        1
    }
}

/// Fresh in-memory database with migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_pool() -> DbPool {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .expect("Failed to open in-memory database");
    let pool = DbPool::from_connection(conn);
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

fn test_keys() -> SessionKeys {
    SessionKeys::new(SecretString::from(TEST_SESSION_SECRET.to_string()), 3600)
}

/// Bearer token for the given identity.
pub fn token_for(user_id: Uuid, role: Role) -> String {
    test_keys()
        .issue(user_id, role)
        .expect("Failed to issue test token")
}

/// Create a test app with every `/api/v1` route.
pub async fn create_test_app(
    pool: &DbPool,
    emitter: Arc<RecordingEmitter>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let notifier: Arc<dyn NotificationEmitter> = emitter;

    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_keys()))
            .app_data(web::Data::from(notifier))
            .app_data(api::json_config())
            .app_data(api::query_config())
            .app_data(api::path_config())
            .service(web::scope("/api/v1").configure(api::configure_api)),
    )
    .await
}

/// Seeded school:
/// - classes A, B and C
/// - Mathematics and Science owned by A, Mathematics owned by B
/// - a teacher assigned to A's Mathematics and to classes A and B
/// - students "A-01" and "A-02" in A, "B-01" in B, "C-01" in C
pub struct School {
    pub admin: user::Model,
    pub class_a: class::Model,
    pub class_b: class::Model,
    pub class_c: class::Model,
    pub math_a: subject::Model,
    pub science_a: subject::Model,
    pub math_b: subject::Model,
    pub teacher_user: user::Model,
    pub teacher: TeacherAssignment,
    pub student_user: user::Model,
    pub student: student::Model,
    pub classmate_user: user::Model,
    pub classmate: student::Model,
    pub student_b_user: user::Model,
    pub student_b: student::Model,
    pub student_c_user: user::Model,
    pub student_c: student::Model,
}

impl School {
    pub fn admin_token(&self) -> String {
        token_for(self.admin.id, Role::Admin)
    }

    pub fn teacher_token(&self) -> String {
        token_for(self.teacher_user.id, Role::Teacher)
    }

    pub fn student_token(&self) -> String {
        token_for(self.student_user.id, Role::Student)
    }
}

async fn seed_class(pool: &DbPool, name: &str) -> class::Model {
    pool.insert_class(&CreateClassRequest {
        name: name.to_string(),
        section: None,
        academic_year: Some("2026".to_string()),
    })
    .await
    .expect("seed class")
}

async fn seed_subject(pool: &DbPool, name: &str, code: &str, class_id: Uuid) -> subject::Model {
    pool.insert_subject(&CreateSubjectRequest {
        name: name.to_string(),
        code: code.to_string(),
        class_id,
    })
    .await
    .expect("seed subject")
}

pub async fn seed_user(pool: &DbPool, name: &str, role: Role) -> user::Model {
    let email = format!("{}@school.test", name.to_lowercase().replace(' ', "."));
    pool.insert_user(name, &email, role)
        .await
        .expect("seed user")
}

async fn seed_student(
    pool: &DbPool,
    name: &str,
    class_id: Uuid,
    roll: &str,
) -> (user::Model, student::Model) {
    let user = seed_user(pool, name, Role::Student).await;
    let student = pool
        .insert_student(&CreateStudentRequest {
            user_id: user.id,
            class_id,
            roll_number: roll.to_string(),
            parent_name: None,
            parent_phone: None,
        })
        .await
        .expect("seed student");
    (user, student)
}

pub async fn seed_school(pool: &DbPool) -> School {
    let admin = seed_user(pool, "Principal", Role::Admin).await;

    let class_a = seed_class(pool, "Grade 7 A").await;
    let class_b = seed_class(pool, "Grade 7 B").await;
    let class_c = seed_class(pool, "Grade 8 C").await;

    let math_a = seed_subject(pool, "Mathematics", "MATH-7A", class_a.id).await;
    let science_a = seed_subject(pool, "Science", "SCI-7A", class_a.id).await;
    let math_b = seed_subject(pool, "Mathematics", "MATH-7B", class_b.id).await;

    let teacher_user = seed_user(pool, "Maya Teacher", Role::Teacher).await;
    let teacher = pool
        .insert_teacher(teacher_user.id, &[math_a.id], &[class_a.id, class_b.id])
        .await
        .expect("seed teacher");

    let (student_user, student) = seed_student(pool, "Ada Lovelace", class_a.id, "A-01").await;
    let (classmate_user, classmate) = seed_student(pool, "Alan Turing", class_a.id, "A-02").await;
    let (student_b_user, student_b) = seed_student(pool, "Grace Hopper", class_b.id, "B-01").await;
    let (student_c_user, student_c) = seed_student(pool, "Edsger Dijkstra", class_c.id, "C-01").await;

    School {
        admin,
        class_a,
        class_b,
        class_c,
        math_a,
        science_a,
        math_b,
        teacher_user,
        teacher,
        student_user,
        student,
        classmate_user,
        classmate,
        student_b_user,
        student_b,
        student_c_user,
        student_c,
    }
}

pub async fn seed_exam(
    pool: &DbPool,
    title: &str,
    subject: &subject::Model,
    term: Term,
    exam_type: ExamType,
    max_marks: f64,
    published: bool,
) -> exam::Model {
    let created = pool
        .insert_exam(
            &CreateExamRequest {
                title: title.to_string(),
                subject_id: subject.id,
                class_id: subject.class_id,
                exam_type,
                term,
                max_marks,
                exam_date: None,
            },
            Uuid::new_v4(),
        )
        .await
        .expect("seed exam");
    if published {
        pool.publish_exam(created).await.expect("publish exam")
    } else {
        created
    }
}

/// Insert a grade directly, bypassing the API.
pub async fn seed_grade(
    pool: &DbPool,
    student: &student::Model,
    subject: &subject::Model,
    term: Term,
    marks: f64,
    max_marks: f64,
    exam: Option<&exam::Model>,
) -> grade::Model {
    pool.insert_grade(NewGrade {
        student_id: student.id,
        class_id: student.class_id,
        subject_id: subject.id,
        teacher_id: None,
        exam_id: exam.map(|e| e.id),
        term,
        exam_type: ExamType::Assignment,
        marks,
        max_marks,
        remarks: None,
    })
    .await
    .expect("seed grade")
}

async fn call<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get_json<S>(app: &S, uri: &str, token: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    call(app, req).await
}

pub async fn post_json<S>(app: &S, uri: &str, token: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request();
    call(app, req).await
}

pub async fn put_json<S>(app: &S, uri: &str, token: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::put()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request();
    call(app, req).await
}

pub async fn delete<S>(app: &S, uri: &str, token: &str) -> u16
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::delete()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    test::call_service(app, req).await.status().as_u16()
}

/// GET returning the raw body and its content type.
pub async fn get_text<S>(app: &S, uri: &str, token: &str) -> (u16, String, String)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = test::read_body(resp).await;
    (
        status,
        String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
        content_type,
    )
}
