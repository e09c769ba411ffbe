//! Aggregated academic result: subject -> term -> exam with mark-weighted totals.
//!
//! Built fresh on every request from the student's visible grades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::report_format::ReportFormat;

use super::grade::Term;

/// Identity block at the top of a result sheet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub class_id: Uuid,
    pub class_name: Option<String>,
}

/// Accumulated marks for a term, a subject, or the whole sheet.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Totals {
    pub total_marks: f64,
    pub total_max_marks: f64,
    pub percentage: f64,
    pub grade: String,
}

/// One graded assessment, in store order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExamResult {
    pub grade_id: Uuid,
    pub exam_id: Option<Uuid>,
    pub exam_title: Option<String>,
    pub exam_type: String,
    pub marks: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TermResult {
    pub term: Term,
    pub exams: Vec<ExamResult>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubjectResult {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub terms: Vec<TermResult>,
    /// Sum of every term's marks over every term's maximum.
    pub overall: Totals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultSummary {
    pub total_subjects: usize,
    pub total_marks: f64,
    pub total_max_marks: f64,
    pub overall_percentage: f64,
    pub overall_grade: String,
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AcademicResult {
    pub student: StudentInfo,
    /// Term filter applied, if any
    pub term: Option<Term>,
    pub subjects: Vec<SubjectResult>,
    pub summary: ResultSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademicResultQuery {
    pub term: Option<Term>,
    #[serde(alias = "classId")]
    pub class_id: Option<Uuid>,
    #[serde(default)]
    pub format: ReportFormat,
}
