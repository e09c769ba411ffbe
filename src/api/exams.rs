//! Exam endpoints: creation, publishing, scoped listing and result exports.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::db::{DbPool, GradeFilter, NewNotification};
use crate::error::{AppError, AppResult};
use crate::models::notification::kind;
use crate::models::{
    ApiResponse, CreateExamRequest, ExamQuery, ExamResponse, ExamResultsQuery, Role,
};
use crate::services::notifier::{self, NotificationEmitter};
use crate::services::report_format::{self, ExamResultRow, ReportFormat};
use crate::services::scope;

/// Configure exam routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/exams")
            .route(web::get().to(list_exams))
            .route(web::post().to(create_exam)),
    )
    .service(web::resource("/exams/{exam_id}/publish").route(web::post().to(publish_exam)))
    .service(web::resource("/exams/{exam_id}/results").route(web::get().to(exam_results)));
}

/// Create an exam for a (subject, class) pair the caller may grade.
#[utoipa::path(
    post,
    path = "/api/v1/exams",
    tag = "Exams",
    request_body = CreateExamRequest,
    responses(
        (status = 201, description = "Exam created (unpublished), wrapped in {success, data}", body = ExamResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Pair outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Subject not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_exam(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateExamRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let scope = scope::resolve(&pool, &auth.caller).await?;
    let subject = pool
        .get_subject_by_id(req.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject".to_string()))?;
    scope.authorize_subject_class(&subject, req.class_id)?;

    let exam = pool.insert_exam(&req, auth.caller.user_id).await?;
    info!(exam_id = %exam.id, subject_id = %exam.subject_id, "Exam created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(ExamResponse::from(exam))))
}

/// Publish an exam and notify the students of its class.
///
/// Publishing twice is a no-op and sends nothing the second time.
#[utoipa::path(
    post,
    path = "/api/v1/exams/{exam_id}/publish",
    tag = "Exams",
    params(("exam_id" = Uuid, Path, description = "Exam UUID")),
    responses(
        (status = 200, description = "Published exam, wrapped in {success, data}", body = ExamResponse),
        (status = 403, description = "Exam outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Exam not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn publish_exam(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    emitter: web::Data<dyn NotificationEmitter>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let exam = pool
        .get_exam_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Exam".to_string()))?;
    let subject = pool
        .get_subject_by_id(exam.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject".to_string()))?;
    scope.authorize_subject_class(&subject, exam.class_id)?;

    if exam.is_published {
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(ExamResponse::from(exam))));
    }

    let exam = pool.publish_exam(exam).await?;
    info!(exam_id = %exam.id, "Exam published");

    let recipients: Vec<Uuid> = pool
        .students_in_class(exam.class_id)
        .await?
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    let message = format!("Results for {} ({}) are now available.", exam.title, subject.name);
    notifier::deliver_quietly(
        &pool,
        emitter.get_ref(),
        &recipients,
        &NewNotification {
            sender_user_id: Some(auth.caller.user_id),
            kind: kind::EXAM_PUBLISHED,
            title: "Exam published",
            message: &message,
        },
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ExamResponse::from(exam))))
}

/// List exams visible to the caller. Students only see published exams of
/// their own class.
#[utoipa::path(
    get,
    path = "/api/v1/exams",
    tag = "Exams",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Filter by class"),
        ("subject_id" = Option<Uuid>, Query, description = "Filter by subject"),
        ("term" = Option<String>, Query, description = "term1, term2 or final")
    ),
    responses(
        (status = 200, description = "Exams, newest first, wrapped in {success, data}", body = [ExamResponse]),
    ),
    security(("bearer" = []))
)]
pub async fn list_exams(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ExamQuery>,
) -> AppResult<HttpResponse> {
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let exams: Vec<ExamResponse> = pool
        .list_exams(&query, &scope.exam_visibility())
        .await?
        .into_iter()
        .map(ExamResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(exams)))
}

/// Graded submissions for one exam, as JSON or a CSV download.
#[utoipa::path(
    get,
    path = "/api/v1/exams/{exam_id}/results",
    tag = "Exams",
    params(
        ("exam_id" = Uuid, Path, description = "Exam UUID"),
        ("format" = Option<String>, Query, description = "json (default) or csv")
    ),
    responses(
        (status = 200, description = "Result rows wrapped in {success, data}, or text/csv", body = [ExamResultRow]),
        (status = 403, description = "Exam outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Exam not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn exam_results(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<ExamResultsQuery>,
) -> AppResult<HttpResponse> {
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let exam = pool
        .get_exam_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Exam".to_string()))?;
    let subject = pool
        .get_subject_by_id(exam.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject".to_string()))?;
    scope.authorize_subject_class(&subject, exam.class_id)?;

    let class_name = pool
        .get_class_by_id(exam.class_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    let grades = pool
        .list_grades(&GradeFilter {
            exam_id: Some(exam.id),
            ..Default::default()
        })
        .await?;

    let student_ids: Vec<Uuid> = grades.iter().map(|g| g.student_id).collect();
    let students: HashMap<Uuid, _> = pool
        .get_students_with_users(&student_ids)
        .await?
        .into_iter()
        .map(|(s, u)| (s.id, (s, u)))
        .collect();

    let rows: Vec<ExamResultRow> = grades
        .into_iter()
        .map(|g| {
            let (roll_number, name, email) = match students.get(&g.student_id) {
                Some((s, u)) => (
                    s.roll_number.clone(),
                    u.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
                    u.as_ref().map(|u| u.email.clone()).unwrap_or_default(),
                ),
                None => Default::default(),
            };
            ExamResultRow {
                grade_id: g.id,
                student_name: name,
                student_email: email,
                student_id: roll_number,
                class_name: class_name.clone(),
                exam_title: exam.title.clone(),
                score: g.marks,
                total: g.max_marks,
                percentage: g.percentage,
                grade: g.grade,
                submitted_at: g.created_at,
            }
        })
        .collect();

    match query.format {
        ReportFormat::Csv => Ok(report_format::csv_response(
            report_format::exam_results_csv(&rows),
            &format!("exam-{}-results.csv", exam.id),
        )),
        ReportFormat::Json => Ok(HttpResponse::Ok().json(ApiResponse::ok(rows))),
    }
}
