//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Records Server",
        version = "0.1.0",
        description = "Class, exam and grade records with scoped term-result reporting and live notifications"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Users
        api::users::create_user,
        api::users::get_me,
        // Records
        api::records::create_class,
        api::records::list_classes,
        api::records::get_class,
        api::records::create_subject,
        api::records::list_subjects,
        api::records::create_teacher,
        api::records::set_teacher_assignments,
        api::records::get_my_teacher_profile,
        api::records::create_student,
        api::records::list_students,
        api::records::get_student,
        // Exams
        api::exams::create_exam,
        api::exams::publish_exam,
        api::exams::list_exams,
        api::exams::exam_results,
        // Grades
        api::grades::create_grade,
        api::grades::bulk_create_grades,
        api::grades::update_grade,
        api::grades::delete_grade,
        api::grades::student_grades,
        api::grades::academic_result,
        api::grades::teacher_grades,
        api::grades::teacher_term_grades,
        api::grades::grade_analytics,
        // Notifications
        api::notifications::create_notification,
        api::notifications::list_notifications,
        api::notifications::mark_notification_read,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Users
            models::Role,
            models::CreateUserRequest,
            models::UserResponse,
            // Records
            models::CreateClassRequest,
            models::ClassResponse,
            models::CreateSubjectRequest,
            models::SubjectResponse,
            models::CreateTeacherRequest,
            models::TeacherAssignmentsRequest,
            models::TeacherResponse,
            models::CreateStudentRequest,
            models::StudentResponse,
            // Exams
            models::Term,
            models::ExamType,
            models::CreateExamRequest,
            models::ExamResponse,
            services::report_format::ReportFormat,
            services::report_format::ExamResultRow,
            // Grades
            models::LetterGrade,
            models::CreateGradeRequest,
            models::UpdateGradeRequest,
            models::BulkCreateGradesRequest,
            models::BulkGradeFailure,
            models::BulkGradeResponse,
            models::GradeResponse,
            models::StudentBrief,
            models::SummaryScope,
            models::Granularity,
            models::AnalyticsBucket,
            services::grade_stats::GradeSummary,
            services::grade_stats::GradeDistribution,
            services::grade_stats::Breakdown,
            services::grade_stats::LeaderboardEntry,
            api::grades::TeacherGradeListResponse,
            api::grades::AnalyticsResponse,
            // Academic result
            models::AcademicResult,
            models::StudentInfo,
            models::SubjectResult,
            models::TermResult,
            models::ExamResult,
            models::Totals,
            models::ResultSummary,
            // Notifications
            models::CreateNotificationRequest,
            models::NotificationResponse,
            api::notifications::DeliveryReport,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Users", description = "User accounts"),
        (name = "Records", description = "Classes, subjects, teachers and students"),
        (name = "Exams", description = "Exam scheduling, publishing and result exports"),
        (name = "Grades", description = "Grade entry, result sheets, teacher view and analytics"),
        (name = "Notifications", description = "Announcements and the caller's inbox")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the bearer session token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
