//! Grade domain enums, grading arithmetic and grade DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::grade;

/// Academic period a grade belongs to. Ordered term1 < term2 < final.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    Term1,
    Term2,
    Final,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::Term1, Term::Term2, Term::Final];

    pub fn as_str(&self) -> &'static str {
        match self {
            Term::Term1 => "term1",
            Term::Term2 => "term2",
            Term::Final => "final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "term1" => Some(Term::Term1),
            "term2" => Some(Term::Term2),
            "final" => Some(Term::Final),
            _ => None,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of assessment a grade stems from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Midterm,
    Final,
    Assignment,
}

impl ExamType {
    pub const ALL: [ExamType; 3] = [ExamType::Midterm, ExamType::Final, ExamType::Assignment];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Midterm => "midterm",
            ExamType::Final => "final",
            ExamType::Assignment => "assignment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "midterm" => Some(ExamType::Midterm),
            "final" => Some(ExamType::Final),
            "assignment" => Some(ExamType::Assignment),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter grade. A step function of percentage:
/// `>= 85` A, `>= 70` B, `>= 55` C, `>= 40` D, otherwise F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

/// Lowest percentage counted as a pass.
pub const PASS_THRESHOLD: f64 = 40.0;

impl LetterGrade {
    pub const ALL: [LetterGrade; 5] = [
        LetterGrade::A,
        LetterGrade::B,
        LetterGrade::C,
        LetterGrade::D,
        LetterGrade::F,
    ];

    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 85.0 {
            LetterGrade::A
        } else if percentage >= 70.0 {
            LetterGrade::B
        } else if percentage >= 55.0 {
            LetterGrade::C
        } else if percentage >= PASS_THRESHOLD {
            LetterGrade::D
        } else {
            LetterGrade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(LetterGrade::A),
            "B" => Some(LetterGrade::B),
            "C" => Some(LetterGrade::C),
            "D" => Some(LetterGrade::D),
            "F" => Some(LetterGrade::F),
            _ => None,
        }
    }

    /// Fixed remark for a result in this band.
    pub fn remarks(&self) -> &'static str {
        match self {
            LetterGrade::A => "Excellent performance. Keep it up!",
            LetterGrade::B => "Very good performance.",
            LetterGrade::C => "Good performance, with room to improve.",
            LetterGrade::D => "Satisfactory. Needs more effort.",
            LetterGrade::F => "Needs significant improvement.",
        }
    }
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `marks / max_marks * 100` rounded to 2 dp. A zero (or negative) maximum
/// yields 0 instead of NaN.
pub fn percentage(marks: f64, max_marks: f64) -> f64 {
    if max_marks <= 0.0 || !max_marks.is_finite() {
        return 0.0;
    }
    round2(marks / max_marks * 100.0)
}

/// Entry-boundary invariant: `max_marks > 0` and `0 <= marks <= max_marks`.
pub fn validate_marks(marks: f64, max_marks: f64) -> Result<(), String> {
    if !marks.is_finite() || !max_marks.is_finite() {
        return Err("marks and max_marks must be finite numbers".to_string());
    }
    if max_marks <= 0.0 {
        return Err("max_marks must be greater than 0".to_string());
    }
    if marks < 0.0 {
        return Err("marks must not be negative".to_string());
    }
    if marks > max_marks {
        return Err(format!(
            "marks ({}) must not exceed max_marks ({})",
            marks, max_marks
        ));
    }
    Ok(())
}

/// Student identity shown next to grade rows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentBrief {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub roll_number: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GradeResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Option<Uuid>,
    pub exam_id: Option<Uuid>,
    pub term: String,
    pub exam_type: String,
    pub marks: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentBrief>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<grade::Model> for GradeResponse {
    fn from(m: grade::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            class_id: m.class_id,
            subject_id: m.subject_id,
            teacher_id: m.teacher_id,
            exam_id: m.exam_id,
            term: m.term,
            exam_type: m.exam_type,
            marks: m.marks,
            max_marks: m.max_marks,
            percentage: m.percentage,
            grade: m.grade,
            remarks: m.remarks,
            student: None,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl GradeResponse {
    pub fn with_student(mut self, student: Option<StudentBrief>) -> Self {
        self.student = student;
        self
    }
}

/// Request body for `POST /grades` and each item of `POST /grades/bulk`.
///
/// When `exam_id` is set the exam supplies `term`, `exam_type` and
/// `max_marks` for any of them left out.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateGradeRequest {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    #[serde(default)]
    pub exam_id: Option<Uuid>,
    #[serde(default)]
    pub term: Option<Term>,
    #[serde(default)]
    pub exam_type: Option<ExamType>,
    pub marks: f64,
    #[serde(default)]
    pub max_marks: Option<f64>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Request body for `PUT /grades/{id}`. Every updatable field is listed;
/// anything else is rejected.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateGradeRequest {
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(default)]
    pub max_marks: Option<f64>,
    #[serde(default)]
    pub term: Option<Term>,
    #[serde(default)]
    pub exam_type: Option<ExamType>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl UpdateGradeRequest {
    pub fn is_empty(&self) -> bool {
        self.marks.is_none()
            && self.max_marks.is_none()
            && self.term.is_none()
            && self.exam_type.is_none()
            && self.remarks.is_none()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkCreateGradesRequest {
    pub grades: Vec<CreateGradeRequest>,
}

/// A rejected bulk item, reported inline.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkGradeFailure {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkGradeResponse {
    pub success: bool,
    pub inserted: usize,
    pub failed: usize,
    pub data: Vec<GradeResponse>,
    pub errors: Vec<BulkGradeFailure>,
}

/// Which rows the teacher view's summary is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SummaryScope {
    /// Only the rows on the returned page.
    #[default]
    Page,
    /// Every row matching the filters.
    Filtered,
}

/// Query string for the teacher subject/class view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherGradeQuery {
    pub term: Option<Term>,
    #[serde(alias = "examType")]
    pub exam_type: Option<ExamType>,
    #[serde(alias = "studentId")]
    pub student_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Field name, `-` prefix for descending (default `-created_at`)
    pub sort: Option<String>,
    #[serde(alias = "summaryScope")]
    pub summary_scope: Option<SummaryScope>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(alias = "classId")]
    pub class_id: Option<Uuid>,
    #[serde(alias = "subjectId")]
    pub subject_id: Option<Uuid>,
    #[serde(alias = "examId")]
    pub exam_id: Option<Uuid>,
    pub term: Option<Term>,
    #[serde(alias = "examType")]
    pub exam_type: Option<ExamType>,
    pub granularity: Option<Granularity>,
}

/// One period of grade analytics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsBucket {
    /// `YYYY-MM-DD` or `YYYY-MM`
    pub period: String,
    pub count: i64,
    pub average_percentage: f64,
    pub min_percentage: f64,
    pub max_percentage: f64,
}
