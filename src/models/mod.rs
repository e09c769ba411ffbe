//! Request/response models and domain enums.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod academic;
pub mod exam;
pub mod grade;
pub mod notification;
pub mod records;
pub mod user;

// Re-export commonly used types
pub use academic::{
    AcademicResult, AcademicResultQuery, ExamResult, ResultSummary, StudentInfo, SubjectResult,
    TermResult, Totals,
};
pub use exam::{CreateExamRequest, ExamQuery, ExamResponse, ExamResultsQuery};
pub use grade::{
    AnalyticsBucket, AnalyticsQuery, BulkCreateGradesRequest, BulkGradeFailure,
    BulkGradeResponse, CreateGradeRequest, ExamType, GradeResponse, Granularity, LetterGrade,
    StudentBrief, SummaryScope, TeacherGradeQuery, Term, UpdateGradeRequest,
};
pub use notification::{
    CreateNotificationRequest, NotificationEvent, NotificationQuery, NotificationResponse,
};
pub use records::{
    ClassResponse, CreateClassRequest, CreateStudentRequest, CreateSubjectRequest,
    CreateTeacherRequest, StudentQuery, StudentResponse, SubjectQuery, SubjectResponse,
    TeacherAssignmentsRequest, TeacherResponse,
};
pub use user::{CreateUserRequest, Role, UserResponse};

/// Pagination parameters.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

impl PaginationParams {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self { page, limit }
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Clamp limit to the allowed range.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.clamped_limit())
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn from_params(params: &PaginationParams, total: u64) -> Self {
        Self::new(params.page(), params.clamped_limit(), total)
    }
}

/// Standard success envelope: `{success: true, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated success envelope: `{success, count, pagination, data}`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}
