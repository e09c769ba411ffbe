//! Database queries for classes.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::class::{self, ActiveModel, Entity as Class};
use crate::error::{AppError, AppResult};
use crate::models::CreateClassRequest;

use super::DbPool;

impl DbPool {
    pub async fn insert_class(&self, req: &CreateClassRequest) -> AppResult<class::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(req.name.trim().to_string()),
            section: Set(req.section.clone()),
            academic_year: Set(req.academic_year.clone()),
            created_at: Set(Utc::now()),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert class: {}", e)))
    }

    pub async fn get_class_by_id(&self, id: Uuid) -> AppResult<Option<class::Model>> {
        Ok(Class::find_by_id(id).one(self.connection()).await?)
    }

    /// List classes, optionally restricted to a set of ids.
    pub async fn list_classes(&self, only: Option<&[Uuid]>) -> AppResult<Vec<class::Model>> {
        let mut select = Class::find();
        if let Some(ids) = only {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(class::Column::Id.is_in(ids.iter().copied()));
        }

        Ok(select
            .order_by_asc(class::Column::Name)
            .order_by_asc(class::Column::Id)
            .all(self.connection())
            .await?)
    }
}
