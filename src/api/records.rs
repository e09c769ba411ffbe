//! Class, subject, teacher and student records.
//!
//! Writes are admin-only. Reads are narrowed by the caller's scope.

use std::collections::HashSet;

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::db::{DbPool, TeacherAssignment};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApiResponse, ClassResponse, CreateClassRequest, CreateStudentRequest, CreateSubjectRequest,
    CreateTeacherRequest, ListResponse, Pagination, PaginationParams, Role, StudentQuery,
    StudentResponse, SubjectQuery, SubjectResponse, TeacherAssignmentsRequest, TeacherResponse,
};
use crate::services::scope::{self, Scope};

/// Configure record routes.
/// Note: More specific routes must be registered before generic ones.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/classes")
            .route(web::get().to(list_classes))
            .route(web::post().to(create_class)),
    )
    .service(web::resource("/classes/{class_id}").route(web::get().to(get_class)))
    .service(
        web::resource("/subjects")
            .route(web::get().to(list_subjects))
            .route(web::post().to(create_subject)),
    )
    .service(web::resource("/teachers/me").route(web::get().to(get_my_teacher_profile)))
    .service(web::resource("/teachers").route(web::post().to(create_teacher)))
    .service(
        web::resource("/teachers/{teacher_id}/assignments")
            .route(web::put().to(set_teacher_assignments)),
    )
    .service(
        web::resource("/students")
            .route(web::get().to(list_students))
            .route(web::post().to(create_student)),
    )
    .service(web::resource("/students/{student_id}").route(web::get().to(get_student)));
}

// ============================================================================
// Classes
// ============================================================================

/// Create a class (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/classes",
    tag = "Records",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created, wrapped in {success, data}", body = ClassResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_class(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateClassRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin])?;
    let req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let class = pool.insert_class(&req).await?;
    info!(class_id = %class.id, name = %class.name, "Class created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(ClassResponse::from(class))))
}

/// List the classes visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/classes",
    tag = "Records",
    responses(
        (status = 200, description = "Visible classes, wrapped in {success, data}", body = [ClassResponse]),
        (status = 404, description = "Caller's profile missing", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_classes(auth: SessionAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let scope = scope::resolve(&pool, &auth.caller).await?;
    let allowed = scope.class_filter();

    let classes: Vec<ClassResponse> = pool
        .list_classes(allowed.as_deref())
        .await?
        .into_iter()
        .map(ClassResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(classes)))
}

#[utoipa::path(
    get,
    path = "/api/v1/classes/{class_id}",
    tag = "Records",
    params(("class_id" = Uuid, Path, description = "Class UUID")),
    responses(
        (status = 200, description = "Class, wrapped in {success, data}", body = ClassResponse),
        (status = 403, description = "Class outside caller's scope", body = crate::error::ErrorResponse),
        (status = 404, description = "Class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_class(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let class_id = path.into_inner();
    let scope = scope::resolve(&pool, &auth.caller).await?;

    let class = pool
        .get_class_by_id(class_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class".to_string()))?;
    scope.authorize_class(class.id)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ClassResponse::from(class))))
}

// ============================================================================
// Subjects
// ============================================================================

/// Create a subject owned by one class (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/subjects",
    tag = "Records",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created, wrapped in {success, data}", body = SubjectResponse),
        (status = 404, description = "Class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_subject(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateSubjectRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin])?;
    let req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    pool.get_class_by_id(req.class_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class".to_string()))?;

    let subject = pool.insert_subject(&req).await?;
    info!(subject_id = %subject.id, class_id = %subject.class_id, "Subject created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(SubjectResponse::from(subject))))
}

#[utoipa::path(
    get,
    path = "/api/v1/subjects",
    tag = "Records",
    params(("class_id" = Option<Uuid>, Query, description = "Only subjects of this class")),
    responses(
        (status = 200, description = "Visible subjects, wrapped in {success, data}", body = [SubjectResponse]),
    ),
    security(("bearer" = []))
)]
pub async fn list_subjects(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<SubjectQuery>,
) -> AppResult<HttpResponse> {
    let scope = scope::resolve(&pool, &auth.caller).await?;
    let allowed = scope.subject_filter();

    let subjects: Vec<SubjectResponse> = pool
        .list_subjects(query.class_id, allowed.as_deref())
        .await?
        .into_iter()
        .map(SubjectResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(subjects)))
}

// ============================================================================
// Teachers
// ============================================================================

/// Every referenced subject and class must exist.
async fn validate_assignment_refs(
    pool: &DbPool,
    subject_ids: &[Uuid],
    class_ids: &[Uuid],
) -> AppResult<()> {
    let wanted: HashSet<Uuid> = subject_ids.iter().copied().collect();
    let found = pool.get_subjects_by_ids(subject_ids).await?;
    if found.len() != wanted.len() {
        return Err(AppError::NotFound("Subject".to_string()));
    }

    let wanted: HashSet<Uuid> = class_ids.iter().copied().collect();
    let found = pool.list_classes(Some(class_ids)).await?;
    if !class_ids.is_empty() && found.len() != wanted.len() {
        return Err(AppError::NotFound("Class".to_string()));
    }
    Ok(())
}

async fn teacher_response(
    pool: &DbPool,
    assignment: TeacherAssignment,
) -> AppResult<TeacherResponse> {
    let user = pool
        .get_user_by_id(assignment.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(TeacherResponse {
        id: assignment.teacher_id,
        user_id: assignment.user_id,
        name: user.name,
        email: user.email,
        subject_ids: assignment.subject_list(),
        class_ids: assignment.class_list(),
        created_at: assignment.created_at,
    })
}

/// Create a teacher profile for a teacher-role user (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    tag = "Records",
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created, wrapped in {success, data}", body = TeacherResponse),
        (status = 400, description = "User is not a teacher or already has a profile", body = crate::error::ErrorResponse),
        (status = 404, description = "User, subject or class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_teacher(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateTeacherRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin])?;
    let req = body.into_inner();

    let user = pool
        .get_user_by_id(req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    if Role::parse(&user.role) != Some(Role::Teacher) {
        return Err(AppError::InvalidInput(
            "user does not have the teacher role".to_string(),
        ));
    }
    if pool.get_teacher_by_user_id(user.id).await?.is_some() {
        return Err(AppError::InvalidInput(
            "user already has a teacher profile".to_string(),
        ));
    }
    validate_assignment_refs(&pool, &req.subject_ids, &req.class_ids).await?;

    let assignment = pool
        .insert_teacher(user.id, &req.subject_ids, &req.class_ids)
        .await?;
    info!(
        teacher_id = %assignment.teacher_id,
        subjects = assignment.subject_ids.len(),
        classes = assignment.class_ids.len(),
        "Teacher created"
    );

    let response = teacher_response(&pool, assignment).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(response)))
}

/// Replace a teacher's subject and class sets (admin only).
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{teacher_id}/assignments",
    tag = "Records",
    params(("teacher_id" = Uuid, Path, description = "Teacher UUID")),
    request_body = TeacherAssignmentsRequest,
    responses(
        (status = 200, description = "Updated teacher, wrapped in {success, data}", body = TeacherResponse),
        (status = 400, description = "Unknown fields or invalid body", body = crate::error::ErrorResponse),
        (status = 404, description = "Teacher, subject or class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn set_teacher_assignments(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<TeacherAssignmentsRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin])?;
    let teacher_id = path.into_inner();
    let req = body.into_inner();

    pool.get_teacher_assignment(teacher_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
    validate_assignment_refs(&pool, &req.subject_ids, &req.class_ids).await?;

    pool.set_teacher_assignments(teacher_id, &req.subject_ids, &req.class_ids)
        .await?;
    info!(teacher_id = %teacher_id, "Teacher assignments replaced");

    let assignment = pool
        .get_teacher_assignment(teacher_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
    let response = teacher_response(&pool, assignment).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/teachers/me",
    tag = "Records",
    responses(
        (status = 200, description = "Own profile with assignments, wrapped in {success, data}", body = TeacherResponse),
        (status = 403, description = "Caller is not a teacher", body = crate::error::ErrorResponse),
        (status = 404, description = "Teacher profile not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_my_teacher_profile(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Teacher])?;

    let assignment = pool
        .get_teacher_assignment_by_user(auth.caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher profile".to_string()))?;

    let response = teacher_response(&pool, assignment).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}

// ============================================================================
// Students
// ============================================================================

/// Create a student profile for a student-role user (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/students",
    tag = "Records",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created, wrapped in {success, data}", body = StudentResponse),
        (status = 400, description = "User is not a student or already has a profile", body = crate::error::ErrorResponse),
        (status = 404, description = "User or class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_student(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateStudentRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin])?;
    let req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let user = pool
        .get_user_by_id(req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    if Role::parse(&user.role) != Some(Role::Student) {
        return Err(AppError::InvalidInput(
            "user does not have the student role".to_string(),
        ));
    }
    if pool.get_student_by_user_id(user.id).await?.is_some() {
        return Err(AppError::InvalidInput(
            "user already has a student profile".to_string(),
        ));
    }
    pool.get_class_by_id(req.class_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class".to_string()))?;

    let student = pool.insert_student(&req).await?;
    info!(student_id = %student.id, class_id = %student.class_id, "Student created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(StudentResponse::from_parts(
        student,
        Some(user),
    ))))
}

/// List students. Teachers see their assigned classes; students are refused.
#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "Records",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Only students of this class"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Paginated students: {success, count, pagination, data}", body = [StudentResponse]),
        (status = 403, description = "Students may not list students", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_students(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<StudentQuery>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let scope = scope::resolve(&pool, &auth.caller).await?;
    let query = query.into_inner();

    let class_ids = match query.class_id {
        Some(class_id) => {
            scope.authorize_class(class_id)?;
            Some(vec![class_id])
        }
        None => scope.class_filter(),
    };

    let params = PaginationParams::new(query.page, query.limit);
    let (rows, total) = pool.list_students(class_ids.as_deref(), &params).await?;

    let data: Vec<StudentResponse> = rows
        .into_iter()
        .map(|(s, u)| StudentResponse::from_parts(s, u))
        .collect();

    Ok(HttpResponse::Ok().json(ListResponse::new(
        data,
        Pagination::from_params(&params, total),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    tag = "Records",
    params(("student_id" = Uuid, Path, description = "Student UUID")),
    responses(
        (status = 200, description = "Student, wrapped in {success, data}", body = StudentResponse),
        (status = 403, description = "Student outside caller's scope", body = crate::error::ErrorResponse),
        (status = 404, description = "Student not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_student(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let scope: Scope = scope::resolve(&pool, &auth.caller).await?;

    let (student, user) = pool
        .get_student_with_user(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    scope.authorize_student(&student)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(StudentResponse::from_parts(student, user))))
}
