//! Database queries for subjects.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::subject::{self, ActiveModel, Entity as Subject};
use crate::error::{AppError, AppResult};
use crate::models::CreateSubjectRequest;

use super::DbPool;

impl DbPool {
    pub async fn insert_subject(&self, req: &CreateSubjectRequest) -> AppResult<subject::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(req.name.trim().to_string()),
            code: Set(req.code.trim().to_string()),
            class_id: Set(req.class_id),
            created_at: Set(Utc::now()),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert subject: {}", e)))
    }

    pub async fn get_subject_by_id(&self, id: Uuid) -> AppResult<Option<subject::Model>> {
        Ok(Subject::find_by_id(id).one(self.connection()).await?)
    }

    /// List subjects filtered by owning class and/or an id allow-list.
    pub async fn list_subjects(
        &self,
        class_id: Option<Uuid>,
        only: Option<&[Uuid]>,
    ) -> AppResult<Vec<subject::Model>> {
        let mut select = Subject::find();
        if let Some(class_id) = class_id {
            select = select.filter(subject::Column::ClassId.eq(class_id));
        }
        if let Some(ids) = only {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(subject::Column::Id.is_in(ids.iter().copied()));
        }

        Ok(select
            .order_by_asc(subject::Column::Name)
            .order_by_asc(subject::Column::Id)
            .all(self.connection())
            .await?)
    }

    pub async fn get_subjects_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<subject::Model>> {
        self.list_subjects(None, Some(ids)).await
    }

    /// Ids of every subject owned by a class.
    pub async fn subject_ids_for_class(&self, class_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .list_subjects(Some(class_id), None)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect())
    }
}
