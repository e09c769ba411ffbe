//! Database queries for exams.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::exam::{self, ActiveModel, Entity as Exam};
use crate::error::{AppError, AppResult};
use crate::models::{CreateExamRequest, ExamQuery};

use super::DbPool;

/// Visibility restrictions applied on top of an [`ExamQuery`].
#[derive(Debug, Clone, Default)]
pub struct ExamVisibility {
    pub subject_ids: Option<Vec<Uuid>>,
    pub class_ids: Option<Vec<Uuid>>,
    pub published_only: bool,
}

impl DbPool {
    pub async fn insert_exam(
        &self,
        req: &CreateExamRequest,
        created_by: Uuid,
    ) -> AppResult<exam::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(req.title.trim().to_string()),
            subject_id: Set(req.subject_id),
            class_id: Set(req.class_id),
            exam_type: Set(req.exam_type.as_str().to_string()),
            term: Set(req.term.as_str().to_string()),
            max_marks: Set(req.max_marks),
            exam_date: Set(req.exam_date),
            is_published: Set(false),
            created_by: Set(created_by),
            created_at: Set(Utc::now()),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert exam: {}", e)))
    }

    pub async fn get_exam_by_id(&self, id: Uuid) -> AppResult<Option<exam::Model>> {
        Ok(Exam::find_by_id(id).one(self.connection()).await?)
    }

    pub async fn get_exams_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<exam::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Exam::find()
            .filter(exam::Column::Id.is_in(ids.iter().copied()))
            .all(self.connection())
            .await?)
    }

    /// Mark an exam published. Returns the updated row.
    pub async fn publish_exam(&self, exam: exam::Model) -> AppResult<exam::Model> {
        let mut active: ActiveModel = exam.into();
        active.is_published = Set(true);
        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to publish exam: {}", e)))
    }

    pub async fn list_exams(
        &self,
        query: &ExamQuery,
        visibility: &ExamVisibility,
    ) -> AppResult<Vec<exam::Model>> {
        let mut select = Exam::find();

        if let Some(class_id) = query.class_id {
            select = select.filter(exam::Column::ClassId.eq(class_id));
        }
        if let Some(subject_id) = query.subject_id {
            select = select.filter(exam::Column::SubjectId.eq(subject_id));
        }
        if let Some(term) = query.term {
            select = select.filter(exam::Column::Term.eq(term.as_str()));
        }
        if let Some(ids) = &visibility.subject_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(exam::Column::SubjectId.is_in(ids.iter().copied()));
        }
        if let Some(ids) = &visibility.class_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(exam::Column::ClassId.is_in(ids.iter().copied()));
        }
        if visibility.published_only {
            select = select.filter(exam::Column::IsPublished.eq(true));
        }

        Ok(select
            .order_by_desc(exam::Column::CreatedAt)
            .order_by_desc(exam::Column::Id)
            .all(self.connection())
            .await?)
    }
}
