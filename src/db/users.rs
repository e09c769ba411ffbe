//! Database queries for users.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::user::{self, ActiveModel, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::Role;

use super::DbPool;

impl DbPool {
    /// Insert a user. Duplicate emails are rejected as invalid input.
    pub async fn insert_user(&self, name: &str, email: &str, role: Role) -> AppResult<user::Model> {
        let email = email.trim().to_lowercase();

        if self.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::InvalidInput(format!(
                "a user with email '{}' already exists",
                email
            )));
        }

        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.trim().to_string()),
            email: Set(email),
            role: Set(role.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert user: {}", e)))
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> AppResult<Option<user::Model>> {
        Ok(User::find_by_id(id).one(self.connection()).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.connection())
            .await?)
    }

    /// Load several users at once, in no particular order.
    pub async fn get_users_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(User::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(self.connection())
            .await?)
    }
}
