//! JSON/CSV rendering for exam result lists and academic result sheets.

use actix_web::HttpResponse;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::AcademicResult;

/// Output format selected with `?format=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

pub const EXAM_RESULTS_HEADER: &str =
    "Student Name,Student Email,Student ID,Class,Exam Title,Score,Total,Percentage,Submitted At";

pub const ACADEMIC_RESULT_HEADER: &str =
    "Subject,Subject Code,Term,Exam,Exam Type,Marks,Max Marks,Percentage,Grade";

/// Quote a field when it holds a comma, quote or line break; inner quotes
/// are doubled.
pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_quote(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// One graded submission in an exam's result list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExamResultRow {
    pub grade_id: uuid::Uuid,
    pub student_name: String,
    pub student_email: String,
    /// School-facing identifier (roll number)
    pub student_id: String,
    pub class_name: String,
    pub exam_title: String,
    pub score: f64,
    pub total: f64,
    pub percentage: f64,
    pub grade: String,
    pub submitted_at: DateTime<Utc>,
}

pub fn exam_results_csv(rows: &[ExamResultRow]) -> String {
    let mut out = String::from(EXAM_RESULTS_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&csv_line(&[
            row.student_name.clone(),
            row.student_email.clone(),
            row.student_id.clone(),
            row.class_name.clone(),
            row.exam_title.clone(),
            row.score.to_string(),
            row.total.to_string(),
            row.percentage.to_string(),
            row.submitted_at.to_rfc3339(),
        ]));
        out.push('\n');
    }
    out
}

/// One row per graded exam, grouped by subject then term.
pub fn academic_result_csv(result: &AcademicResult) -> String {
    let mut out = String::from(ACADEMIC_RESULT_HEADER);
    out.push('\n');
    for subject in &result.subjects {
        for term in &subject.terms {
            for exam in &term.exams {
                out.push_str(&csv_line(&[
                    subject.subject_name.clone(),
                    subject.subject_code.clone(),
                    term.term.as_str().to_string(),
                    exam.exam_title.clone().unwrap_or_default(),
                    exam.exam_type.clone(),
                    exam.marks.to_string(),
                    exam.max_marks.to_string(),
                    exam.percentage.to_string(),
                    exam.grade.clone(),
                ]));
                out.push('\n');
            }
        }
    }
    out
}

/// `text/csv` attachment response.
pub fn csv_response(body: String, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(body)
}
