//! Grade endpoints: entry, the academic result sheet, the teacher
//! subject/class view and analytics.

use std::collections::{HashMap, HashSet};

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::db::{DbPool, GradeChanges, GradeFilter, GradeSort, NewGrade, NewNotification};
use crate::entity::{grade, student, subject};
use crate::error::{AppError, AppResult};
use crate::models::grade::validate_marks;
use crate::models::notification::kind;
use crate::models::{
    AcademicResult, AcademicResultQuery, AnalyticsBucket, AnalyticsQuery, ApiResponse,
    BulkCreateGradesRequest, BulkGradeFailure, BulkGradeResponse, CreateGradeRequest, ExamType,
    GradeResponse, Granularity, Pagination, PaginationParams, Role, StudentBrief, StudentInfo,
    SummaryScope, TeacherGradeQuery, Term, UpdateGradeRequest,
};
use crate::services::aggregation;
use crate::services::grade_stats::{self, GradeSummary};
use crate::services::notifier::{self, NotificationEmitter};
use crate::services::report_format::{self, ReportFormat};
use crate::services::scope::{self, Scope};

/// Configure grade routes.
/// Note: More specific routes must be registered before generic ones.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/grades").route(web::post().to(create_grade)))
        .service(web::resource("/grades/bulk").route(web::post().to(bulk_create_grades)))
        .service(web::resource("/grades/analytics").route(web::get().to(grade_analytics)))
        .service(
            web::resource("/grades/academic-result/{student_id}")
                .route(web::get().to(academic_result)),
        )
        .service(
            web::resource("/grades/student/{student_id}").route(web::get().to(student_grades)),
        )
        .service(
            web::resource("/grades/teacher/subject/{subject_id}/class/{class_id}/term/{term}")
                .route(web::get().to(teacher_term_grades)),
        )
        .service(
            web::resource("/grades/teacher/subject/{subject_id}/class/{class_id}")
                .route(web::get().to(teacher_grades)),
        )
        .service(
            web::resource("/grades/{grade_id}")
                .route(web::put().to(update_grade))
                .route(web::delete().to(delete_grade)),
        );
}

/// Paginated teacher view: `{success, count, pagination, summary, data}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherGradeListResponse {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub summary: GradeSummary,
    pub data: Vec<GradeResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub granularity: Granularity,
    pub data: Vec<AnalyticsBucket>,
}

// ============================================================================
// Grade entry
// ============================================================================

/// A grade that passed validation and scoping, with the records it touches.
struct PreparedGrade {
    new: NewGrade,
    student: student::Model,
    subject: subject::Model,
}

/// Validate one grade request against the caller's scope.
///
/// The class always comes from the student. An attached exam must belong to
/// the same subject and class, and fills in whatever the request leaves out.
async fn prepare_grade(
    pool: &DbPool,
    scope: &Scope,
    req: CreateGradeRequest,
) -> AppResult<PreparedGrade> {
    let student = pool
        .get_student_by_id(req.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    let subject = pool
        .get_subject_by_id(req.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject".to_string()))?;
    scope.authorize_subject_class(&subject, student.class_id)?;

    let (mut term, mut exam_type, mut max_marks) = (req.term, req.exam_type, req.max_marks);
    if let Some(exam_id) = req.exam_id {
        let exam = pool
            .get_exam_by_id(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam".to_string()))?;
        if exam.subject_id != subject.id || exam.class_id != student.class_id {
            return Err(AppError::InvalidInput(
                "exam does not belong to this subject and class".to_string(),
            ));
        }
        term = term.or_else(|| Term::parse(&exam.term));
        exam_type = exam_type.or_else(|| ExamType::parse(&exam.exam_type));
        max_marks = max_marks.or(Some(exam.max_marks));
    }

    let term = term.ok_or_else(|| AppError::InvalidInput("term is required".to_string()))?;
    let exam_type =
        exam_type.ok_or_else(|| AppError::InvalidInput("exam_type is required".to_string()))?;
    let max_marks =
        max_marks.ok_or_else(|| AppError::InvalidInput("max_marks is required".to_string()))?;
    validate_marks(req.marks, max_marks).map_err(AppError::InvalidInput)?;

    Ok(PreparedGrade {
        new: NewGrade {
            student_id: student.id,
            class_id: student.class_id,
            subject_id: subject.id,
            teacher_id: scope.teacher_id(),
            exam_id: req.exam_id,
            term,
            exam_type,
            marks: req.marks,
            max_marks,
            remarks: req.remarks.filter(|r| !r.trim().is_empty()),
        },
        student,
        subject,
    })
}

fn grade_message(subject_name: &str, g: &grade::Model) -> String {
    format!(
        "{} ({}): {}/{} ({}%, {})",
        subject_name, g.term, g.marks, g.max_marks, g.percentage, g.grade
    )
}

/// Record one grade and notify the student.
#[utoipa::path(
    post,
    path = "/api/v1/grades",
    tag = "Grades",
    request_body = CreateGradeRequest,
    responses(
        (status = 201, description = "Grade recorded, wrapped in {success, data}", body = GradeResponse),
        (status = 400, description = "Invalid marks, missing term/exam type, or unknown fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Pair outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Student, subject or exam not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_grade(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    emitter: web::Data<dyn NotificationEmitter>,
    body: web::Json<CreateGradeRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let prepared = prepare_grade(&pool, &scope, body.into_inner()).await?;
    let saved = pool.insert_grade(prepared.new).await?;
    info!(
        grade_id = %saved.id,
        student_id = %saved.student_id,
        subject_id = %saved.subject_id,
        percentage = saved.percentage,
        "Grade recorded"
    );

    let message = grade_message(&prepared.subject.name, &saved);
    notifier::deliver_quietly(
        &pool,
        emitter.get_ref(),
        &[prepared.student.user_id],
        &NewNotification {
            sender_user_id: Some(auth.caller.user_id),
            kind: kind::GRADE_POSTED,
            title: "New grade posted",
            message: &message,
        },
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::ok(GradeResponse::from(saved))))
}

/// Record many grades. Valid items are inserted, the rest reported inline.
#[utoipa::path(
    post,
    path = "/api/v1/grades/bulk",
    tag = "Grades",
    request_body = BulkCreateGradesRequest,
    responses(
        (status = 200, description = "Inserted rows plus per-item failures", body = BulkGradeResponse),
        (status = 400, description = "Empty list or malformed body", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn bulk_create_grades(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    emitter: web::Data<dyn NotificationEmitter>,
    body: web::Json<BulkCreateGradesRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let items = body.into_inner().grades;
    if items.is_empty() {
        return Err(AppError::InvalidInput("grades must not be empty".to_string()));
    }
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let mut accepted = Vec::new();
    let mut recipients = HashSet::new();
    let mut errors = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match prepare_grade(&pool, &scope, item).await {
            Ok(prepared) => {
                recipients.insert(prepared.student.user_id);
                accepted.push(prepared.new);
            }
            Err(AppError::Database(e)) => return Err(AppError::Database(e)),
            Err(e) => errors.push(BulkGradeFailure {
                index,
                message: e.to_string(),
            }),
        }
    }

    let saved = pool.insert_grades(accepted).await?;
    info!(inserted = saved.len(), failed = errors.len(), "Bulk grades recorded");
    if !errors.is_empty() {
        warn!(failed = errors.len(), "Bulk grade items rejected");
    }

    if !saved.is_empty() {
        let recipients: Vec<Uuid> = recipients.into_iter().collect();
        notifier::deliver_quietly(
            &pool,
            emitter.get_ref(),
            &recipients,
            &NewNotification {
                sender_user_id: Some(auth.caller.user_id),
                kind: kind::GRADE_POSTED,
                title: "New grades posted",
                message: "New grades have been posted to your record.",
            },
        )
        .await;
    }

    let data: Vec<GradeResponse> = saved.into_iter().map(GradeResponse::from).collect();
    Ok(HttpResponse::Ok().json(BulkGradeResponse {
        success: errors.is_empty(),
        inserted: data.len(),
        failed: errors.len(),
        data,
        errors,
    }))
}

/// Load a grade and check the caller may change it.
async fn load_writable_grade(
    pool: &DbPool,
    scope: &Scope,
    grade_id: Uuid,
) -> AppResult<(grade::Model, subject::Model)> {
    let existing = pool
        .get_grade_by_id(grade_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Grade".to_string()))?;
    let subject = pool
        .get_subject_by_id(existing.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject".to_string()))?;
    scope.authorize_subject_class(&subject, existing.class_id)?;
    Ok((existing, subject))
}

#[utoipa::path(
    put,
    path = "/api/v1/grades/{grade_id}",
    tag = "Grades",
    params(("grade_id" = Uuid, Path, description = "Grade UUID")),
    request_body = UpdateGradeRequest,
    responses(
        (status = 200, description = "Updated grade, wrapped in {success, data}", body = GradeResponse),
        (status = 400, description = "Empty body, unknown fields or invalid marks", body = crate::error::ErrorResponse),
        (status = 403, description = "Grade outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Grade not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_grade(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    emitter: web::Data<dyn NotificationEmitter>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateGradeRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let req = body.into_inner();
    if req.is_empty() {
        return Err(AppError::InvalidInput("no fields to update".to_string()));
    }

    let scope = scope::resolve(&pool, &auth.caller).await?;
    let (existing, subject) = load_writable_grade(&pool, &scope, path.into_inner()).await?;

    let term = match req.term {
        Some(term) => term,
        None => Term::parse(&existing.term)
            .ok_or_else(|| AppError::InvalidInput("stored term is invalid".to_string()))?,
    };
    let exam_type = match req.exam_type {
        Some(exam_type) => exam_type,
        None => ExamType::parse(&existing.exam_type)
            .ok_or_else(|| AppError::InvalidInput("stored exam_type is invalid".to_string()))?,
    };
    let changes = GradeChanges {
        marks: req.marks.unwrap_or(existing.marks),
        max_marks: req.max_marks.unwrap_or(existing.max_marks),
        term,
        exam_type,
        remarks: req.remarks.or_else(|| existing.remarks.clone()),
    };
    validate_marks(changes.marks, changes.max_marks).map_err(AppError::InvalidInput)?;

    let student_id = existing.student_id;
    let saved = pool.update_grade(existing, changes).await?;
    info!(grade_id = %saved.id, percentage = saved.percentage, "Grade updated");

    if let Some(student) = pool.get_student_by_id(student_id).await? {
        let message = grade_message(&subject.name, &saved);
        notifier::deliver_quietly(
            &pool,
            emitter.get_ref(),
            &[student.user_id],
            &NewNotification {
                sender_user_id: Some(auth.caller.user_id),
                kind: kind::GRADE_UPDATED,
                title: "Grade updated",
                message: &message,
            },
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(GradeResponse::from(saved))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/grades/{grade_id}",
    tag = "Grades",
    params(("grade_id" = Uuid, Path, description = "Grade UUID")),
    responses(
        (status = 204, description = "Grade deleted"),
        (status = 403, description = "Grade outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Grade not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_grade(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let (existing, _) = load_writable_grade(&pool, &scope, path.into_inner()).await?;
    let grade_id = existing.id;
    pool.delete_grade(existing).await?;
    info!(grade_id = %grade_id, "Grade deleted");

    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// Student views
// ============================================================================

/// Grades of one student the caller may see, oldest first.
///
/// Students only see grades from published exams (or with no exam).
async fn visible_student_grades(
    pool: &DbPool,
    scope: &Scope,
    student: &student::Model,
    term: Option<Term>,
    class_id: Option<Uuid>,
) -> AppResult<Vec<grade::Model>> {
    scope.authorize_student(student)?;
    pool.list_grades(&GradeFilter {
        student_id: Some(student.id),
        class_id,
        term,
        published_only: matches!(scope, Scope::Student { .. }),
        ..Default::default()
    })
    .await
}

#[utoipa::path(
    get,
    path = "/api/v1/grades/student/{student_id}",
    tag = "Grades",
    params(
        ("student_id" = Uuid, Path, description = "Student UUID"),
        ("term" = Option<String>, Query, description = "term1, term2 or final")
    ),
    responses(
        (status = 200, description = "Flat grade list, wrapped in {success, data}", body = [GradeResponse]),
        (status = 403, description = "Student outside caller's scope", body = crate::error::ErrorResponse),
        (status = 404, description = "Student not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn student_grades(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<AcademicResultQuery>,
) -> AppResult<HttpResponse> {
    let scope = scope::resolve(&pool, &auth.caller).await?;
    let student = pool
        .get_student_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;

    let grades = visible_student_grades(&pool, &scope, &student, query.term, query.class_id).await?;
    let data: Vec<GradeResponse> = grades.into_iter().map(GradeResponse::from).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// Aggregated result sheet: subject, then term, then exam, with
/// mark-weighted totals and an overall grade.
#[utoipa::path(
    get,
    path = "/api/v1/grades/academic-result/{student_id}",
    tag = "Grades",
    params(
        ("student_id" = Uuid, Path, description = "Student UUID"),
        ("term" = Option<String>, Query, description = "Restrict to one term"),
        ("class_id" = Option<Uuid>, Query, description = "Restrict to grades recorded in this class"),
        ("format" = Option<String>, Query, description = "json (default) or csv")
    ),
    responses(
        (status = 200, description = "Result sheet wrapped in {success, data}, or text/csv", body = AcademicResult),
        (status = 403, description = "Student outside caller's scope", body = crate::error::ErrorResponse),
        (status = 404, description = "Student or class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn academic_result(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<AcademicResultQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let (student, user) = pool
        .get_student_with_user(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    if let Some(class_id) = query.class_id {
        pool.get_class_by_id(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Class".to_string()))?;
    }

    let grades =
        visible_student_grades(&pool, &scope, &student, query.term, query.class_id).await?;

    let subject_ids: Vec<Uuid> = unique(grades.iter().map(|g| g.subject_id));
    let subjects: HashMap<Uuid, subject::Model> = pool
        .get_subjects_by_ids(&subject_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let exam_ids: Vec<Uuid> = unique(grades.iter().filter_map(|g| g.exam_id));
    let exam_titles: HashMap<Uuid, String> = pool
        .get_exams_by_ids(&exam_ids)
        .await?
        .into_iter()
        .map(|e| (e.id, e.title))
        .collect();
    let class_name = pool.get_class_by_id(student.class_id).await?.map(|c| c.name);

    let folded = aggregation::aggregate(&grades, &subjects, &exam_titles);
    let (name, email) = user.map(|u| (u.name, u.email)).unwrap_or_default();
    let result = AcademicResult {
        student: StudentInfo {
            id: student.id,
            user_id: student.user_id,
            name,
            email,
            roll_number: student.roll_number,
            class_id: student.class_id,
            class_name,
        },
        term: query.term,
        subjects: folded.subjects,
        summary: folded.summary,
    };
    info!(
        student_id = %result.student.id,
        subjects = result.summary.total_subjects,
        "Academic result built"
    );

    match query.format {
        ReportFormat::Csv => Ok(report_format::csv_response(
            report_format::academic_result_csv(&result),
            &format!("academic-result-{}.csv", result.student.id),
        )),
        ReportFormat::Json => Ok(HttpResponse::Ok().json(ApiResponse::ok(result))),
    }
}

/// Distinct values in first-seen order.
fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

// ============================================================================
// Teacher view
// ============================================================================

async fn student_briefs(pool: &DbPool, ids: &[Uuid]) -> AppResult<HashMap<Uuid, StudentBrief>> {
    Ok(pool
        .get_students_with_users(ids)
        .await?
        .into_iter()
        .map(|(s, u)| {
            let (name, email) = u.map(|u| (u.name, u.email)).unwrap_or_default();
            let brief = StudentBrief {
                id: s.id,
                user_id: s.user_id,
                name,
                email,
                roll_number: s.roll_number,
            };
            (s.id, brief)
        })
        .collect())
}

async fn scoped_grade_view(
    auth: SessionAuth,
    pool: &DbPool,
    subject_id: Uuid,
    class_id: Uuid,
    path_term: Option<Term>,
    query: TeacherGradeQuery,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let scope = scope::resolve(pool, &auth.caller).await?;

    let subject = pool
        .get_subject_by_id(subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject".to_string()))?;
    pool.get_class_by_id(class_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class".to_string()))?;
    scope.authorize_subject_class(&subject, class_id)?;

    let sort = GradeSort::parse(query.sort.as_deref()).map_err(AppError::InvalidInput)?;
    let filter = GradeFilter {
        subject_id: Some(subject_id),
        class_id: Some(class_id),
        term: path_term.or(query.term),
        exam_type: query.exam_type,
        student_id: query.student_id,
        ..Default::default()
    };
    let params = PaginationParams::new(query.page, query.limit);
    let (rows, total) = pool.query_grades_page(&filter, sort, &params).await?;

    let summary_scope = query.summary_scope.unwrap_or_default();
    let filtered_rows;
    let summary_rows: &[grade::Model] = match summary_scope {
        SummaryScope::Page => &rows,
        SummaryScope::Filtered => {
            filtered_rows = pool.list_grades(&filter).await?;
            &filtered_rows
        }
    };

    let student_ids = unique(rows.iter().chain(summary_rows).map(|g| g.student_id));
    let briefs = student_briefs(pool, &student_ids).await?;
    let summary = grade_stats::summarize(summary_rows, &briefs, summary_scope);

    let data: Vec<GradeResponse> = rows
        .into_iter()
        .map(|g| {
            let brief = briefs.get(&g.student_id).cloned();
            GradeResponse::from(g).with_student(brief)
        })
        .collect();

    Ok(HttpResponse::Ok().json(TeacherGradeListResponse {
        success: true,
        count: data.len(),
        pagination: Pagination::from_params(&params, total),
        summary,
        data,
    }))
}

/// Grades for one (subject, class) pair with summary statistics.
#[utoipa::path(
    get,
    path = "/api/v1/grades/teacher/subject/{subject_id}/class/{class_id}",
    tag = "Grades",
    params(
        ("subject_id" = Uuid, Path, description = "Subject UUID"),
        ("class_id" = Uuid, Path, description = "Class UUID"),
        ("term" = Option<String>, Query, description = "term1, term2 or final"),
        ("exam_type" = Option<String>, Query, description = "midterm, final or assignment"),
        ("student_id" = Option<Uuid>, Query, description = "Only this student"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 20, max: 100)"),
        ("sort" = Option<String>, Query, description = "Sort field, '-' prefix for descending (default: -created_at)"),
        ("summary_scope" = Option<String>, Query, description = "page (default) or filtered")
    ),
    responses(
        (status = 200, description = "Page of grades with summary", body = TeacherGradeListResponse),
        (status = 400, description = "Unknown sort field or class mismatch", body = crate::error::ErrorResponse),
        (status = 403, description = "Pair outside caller's assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Teacher profile, subject or class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn teacher_grades(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<TeacherGradeQuery>,
) -> AppResult<HttpResponse> {
    let (subject_id, class_id) = path.into_inner();
    scoped_grade_view(auth, &pool, subject_id, class_id, None, query.into_inner()).await
}

/// Same as the subject/class view with the term fixed by the path.
#[utoipa::path(
    get,
    path = "/api/v1/grades/teacher/subject/{subject_id}/class/{class_id}/term/{term}",
    tag = "Grades",
    params(
        ("subject_id" = Uuid, Path, description = "Subject UUID"),
        ("class_id" = Uuid, Path, description = "Class UUID"),
        ("term" = String, Path, description = "term1, term2 or final"),
        ("exam_type" = Option<String>, Query, description = "midterm, final or assignment"),
        ("student_id" = Option<Uuid>, Query, description = "Only this student"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 20, max: 100)"),
        ("sort" = Option<String>, Query, description = "Sort field, '-' prefix for descending"),
        ("summary_scope" = Option<String>, Query, description = "page (default) or filtered")
    ),
    responses(
        (status = 200, description = "Page of grades with summary", body = TeacherGradeListResponse),
        (status = 400, description = "Invalid term", body = crate::error::ErrorResponse),
        (status = 403, description = "Pair outside caller's assignments", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn teacher_term_grades(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid, Term)>,
    query: web::Query<TeacherGradeQuery>,
) -> AppResult<HttpResponse> {
    let (subject_id, class_id, term) = path.into_inner();
    scoped_grade_view(auth, &pool, subject_id, class_id, Some(term), query.into_inner()).await
}

// ============================================================================
// Analytics
// ============================================================================

/// Count and average/min/max percentage per day or month.
#[utoipa::path(
    get,
    path = "/api/v1/grades/analytics",
    tag = "Grades",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Filter by class"),
        ("subject_id" = Option<Uuid>, Query, description = "Filter by subject"),
        ("exam_id" = Option<Uuid>, Query, description = "Filter by exam"),
        ("term" = Option<String>, Query, description = "term1, term2 or final"),
        ("exam_type" = Option<String>, Query, description = "midterm, final or assignment"),
        ("granularity" = Option<String>, Query, description = "day (default) or month")
    ),
    responses(
        (status = 200, description = "Buckets in period order", body = AnalyticsResponse),
        (status = 403, description = "Students may not read analytics", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn grade_analytics(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<AnalyticsQuery>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let scope = scope::resolve(&pool, &auth.caller).await?;
    let query = query.into_inner();

    let filter = GradeFilter {
        class_id: query.class_id,
        subject_id: query.subject_id,
        exam_id: query.exam_id,
        term: query.term,
        exam_type: query.exam_type,
        ..scope.grade_filter()
    };
    let granularity = query.granularity.unwrap_or_default();
    let data = pool.grade_analytics(&filter, granularity).await?;

    Ok(HttpResponse::Ok().json(AnalyticsResponse {
        success: true,
        granularity,
        data,
    }))
}
