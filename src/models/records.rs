//! Class, subject, teacher and student DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{class, student, subject, user};

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateClassRequest {
    pub name: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

impl CreateClassRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassResponse {
    pub id: Uuid,
    pub name: String,
    pub section: Option<String>,
    pub academic_year: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<class::Model> for ClassResponse {
    fn from(m: class::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            section: m.section,
            academic_year: m.academic_year,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub code: String,
    pub class_id: Uuid,
}

impl CreateSubjectRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("name", &self.name)?;
        require("code", &self.code)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub class_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<subject::Model> for SubjectResponse {
    fn from(m: subject::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            class_id: m.class_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectQuery {
    #[serde(alias = "classId")]
    pub class_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTeacherRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub subject_ids: Vec<Uuid>,
    #[serde(default)]
    pub class_ids: Vec<Uuid>,
}

/// Replacement assignment sets for `PUT /teachers/{id}/assignments`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TeacherAssignmentsRequest {
    pub subject_ids: Vec<Uuid>,
    pub class_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeacherResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub subject_ids: Vec<Uuid>,
    pub class_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateStudentRequest {
    pub user_id: Uuid,
    pub class_id: Uuid,
    pub roll_number: String,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
}

impl CreateStudentRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("roll_number", &self.roll_number)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub class_id: Uuid,
    pub roll_number: String,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StudentResponse {
    pub fn from_parts(s: student::Model, u: Option<user::Model>) -> Self {
        let (name, email) = u.map(|u| (u.name, u.email)).unwrap_or_default();
        Self {
            id: s.id,
            user_id: s.user_id,
            name,
            email,
            class_id: s.class_id,
            roll_number: s.roll_number,
            parent_name: s.parent_name,
            parent_phone: s.parent_phone,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentQuery {
    #[serde(alias = "classId")]
    pub class_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
