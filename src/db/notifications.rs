//! Database queries for persisted notifications.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::notification::{self, ActiveModel, Entity as Notification};
use crate::error::{AppError, AppResult};
use crate::models::PaginationParams;

use super::DbPool;

/// Content shared by every recipient of one notification.
#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub sender_user_id: Option<Uuid>,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: &'a str,
}

impl DbPool {
    /// Persist one row per recipient. Returned rows keep recipient order.
    pub async fn insert_notifications(
        &self,
        recipients: &[Uuid],
        content: &NewNotification<'_>,
    ) -> AppResult<Vec<notification::Model>> {
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let rows: Vec<notification::Model> = recipients
            .iter()
            .map(|recipient| notification::Model {
                id: Uuid::now_v7(),
                recipient_user_id: *recipient,
                sender_user_id: content.sender_user_id,
                kind: content.kind.to_string(),
                title: content.title.to_string(),
                message: content.message.to_string(),
                is_read: false,
                created_at: now,
            })
            .collect();

        let models = rows.iter().map(|row| ActiveModel {
            id: Set(row.id),
            recipient_user_id: Set(row.recipient_user_id),
            sender_user_id: Set(row.sender_user_id),
            kind: Set(row.kind.clone()),
            title: Set(row.title.clone()),
            message: Set(row.message.clone()),
            is_read: Set(row.is_read),
            created_at: Set(row.created_at),
        });
        Notification::insert_many(models)
            .exec_without_returning(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert notifications: {}", e)))?;

        Ok(rows)
    }

    /// Own notifications, newest first.
    pub async fn list_notifications(
        &self,
        recipient: Uuid,
        unread_only: bool,
        params: &PaginationParams,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        let mut select =
            Notification::find().filter(notification::Column::RecipientUserId.eq(recipient));
        if unread_only {
            select = select.filter(notification::Column::IsRead.eq(false));
        }

        let total = select.clone().count(self.connection()).await?;
        let rows = select
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .offset(params.offset())
            .limit(u64::from(params.clamped_limit()))
            .all(self.connection())
            .await?;

        Ok((rows, total))
    }

    /// Mark read if it belongs to `recipient`. `None` when it does not exist
    /// or belongs to someone else.
    pub async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient: Uuid,
    ) -> AppResult<Option<notification::Model>> {
        let existing = Notification::find_by_id(id)
            .filter(notification::Column::RecipientUserId.eq(recipient))
            .one(self.connection())
            .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };
        if existing.is_read {
            return Ok(Some(existing));
        }

        let mut active: ActiveModel = existing.into();
        active.is_read = Set(true);
        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update notification: {}", e)))?;
        Ok(Some(updated))
    }
}
