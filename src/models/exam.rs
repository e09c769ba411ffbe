//! Exam DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::exam;
use crate::services::report_format::ReportFormat;

use super::grade::{ExamType, Term};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateExamRequest {
    pub title: String,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    pub exam_type: ExamType,
    pub term: Term,
    pub max_marks: f64,
    #[serde(default)]
    pub exam_date: Option<DateTime<Utc>>,
}

impl CreateExamRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if !self.max_marks.is_finite() || self.max_marks <= 0.0 {
            return Err("max_marks must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExamResponse {
    pub id: Uuid,
    pub title: String,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    pub exam_type: String,
    pub term: String,
    pub max_marks: f64,
    pub exam_date: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<exam::Model> for ExamResponse {
    fn from(m: exam::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            subject_id: m.subject_id,
            class_id: m.class_id,
            exam_type: m.exam_type,
            term: m.term,
            max_marks: m.max_marks,
            exam_date: m.exam_date,
            is_published: m.is_published,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamQuery {
    #[serde(alias = "classId")]
    pub class_id: Option<Uuid>,
    #[serde(alias = "subjectId")]
    pub subject_id: Option<Uuid>,
    pub term: Option<Term>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamResultsQuery {
    #[serde(default)]
    pub format: ReportFormat,
}
