//! Notification DTOs and the live event pushed over the socket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::notification;

/// Notification kinds emitted by the server.
pub mod kind {
    pub const GRADE_POSTED: &str = "grade_posted";
    pub const GRADE_UPDATED: &str = "grade_updated";
    pub const EXAM_PUBLISHED: &str = "exam_published";
    pub const ANNOUNCEMENT: &str = "announcement";
}

/// Event delivered to a connected user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Id of the persisted notification, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<&notification::Model> for NotificationEvent {
    fn from(m: &notification::Model) -> Self {
        Self {
            notification_id: Some(m.id),
            kind: m.kind.clone(),
            title: m.title.clone(),
            message: m.message.clone(),
            created_at: m.created_at,
        }
    }
}

/// Request body for `POST /notifications`.
///
/// Recipients are the listed users plus, with `class_id`, every student of
/// that class.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub recipient_user_ids: Vec<Uuid>,
    #[serde(default)]
    pub class_id: Option<Uuid>,
}

impl CreateNotificationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("message is required".to_string());
        }
        if self.recipient_user_ids.is_empty() && self.class_id.is_none() {
            return Err("recipient_user_ids or class_id is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub sender_user_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            title: m.title,
            message: m.message,
            sender_user_id: m.sender_user_id,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default, alias = "unreadOnly")]
    pub unread_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
