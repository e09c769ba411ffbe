//! Notification endpoints: announcements, the caller's inbox and read marks.

use std::collections::HashSet;

use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::db::{DbPool, NewNotification};
use crate::error::{AppError, AppResult};
use crate::models::notification::kind;
use crate::models::{
    ApiResponse, CreateNotificationRequest, ListResponse, NotificationQuery, NotificationResponse,
    Pagination, PaginationParams, Role,
};
use crate::services::notifier::{self, NotificationEmitter};
use crate::services::scope::{self, Scope};

/// Configure notification routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/notifications")
            .route(web::get().to(list_notifications))
            .route(web::post().to(create_notification)),
    )
    .service(
        web::resource("/notifications/{notification_id}/read")
            .route(web::post().to(mark_notification_read)),
    );
}

/// Outcome of an announcement.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryReport {
    /// Notifications stored, one per distinct recipient
    pub recipients: usize,
    /// Recipients with an open socket at send time
    pub delivered_live: usize,
}

/// Work out who receives an announcement, deduplicated in request order.
async fn resolve_recipients(
    pool: &DbPool,
    scope: &Scope,
    req: &CreateNotificationRequest,
) -> AppResult<Vec<Uuid>> {
    let mut seen = HashSet::new();
    let mut recipients = Vec::new();

    match scope {
        Scope::Admin => {
            let wanted: HashSet<Uuid> = req.recipient_user_ids.iter().copied().collect();
            let found = pool.get_users_by_ids(&req.recipient_user_ids).await?;
            if found.len() != wanted.len() {
                return Err(AppError::NotFound("User".to_string()));
            }
        }
        Scope::Teacher(assignment) => {
            for user_id in &req.recipient_user_ids {
                let in_class = pool
                    .get_student_by_user_id(*user_id)
                    .await?
                    .is_some_and(|s| assignment.class_ids.contains(&s.class_id));
                if !in_class {
                    return Err(AppError::Forbidden(
                        "recipient is not a student in one of your classes".to_string(),
                    ));
                }
            }
        }
        Scope::Student { .. } => {
            return Err(AppError::Forbidden(
                "students may not send notifications".to_string(),
            ));
        }
    }
    for user_id in &req.recipient_user_ids {
        if seen.insert(*user_id) {
            recipients.push(*user_id);
        }
    }

    if let Some(class_id) = req.class_id {
        pool.get_class_by_id(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Class".to_string()))?;
        scope.authorize_class(class_id)?;
        for student in pool.students_in_class(class_id).await? {
            if seen.insert(student.user_id) {
                recipients.push(student.user_id);
            }
        }
    }

    Ok(recipients)
}

/// Send an announcement to users and/or a whole class.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    tag = "Notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Stored and pushed, wrapped in {success, data}", body = DeliveryReport),
        (status = 400, description = "Missing title, message or recipients", body = crate::error::ErrorResponse),
        (status = 403, description = "Recipient or class outside caller's scope", body = crate::error::ErrorResponse),
        (status = 404, description = "User or class not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_notification(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    emitter: web::Data<dyn NotificationEmitter>,
    body: web::Json<CreateNotificationRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin, Role::Teacher])?;
    let req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let scope = scope::resolve(&pool, &auth.caller).await?;
    let recipients = resolve_recipients(&pool, &scope, &req).await?;

    let delivered_live = notifier::deliver(
        &pool,
        emitter.get_ref(),
        &recipients,
        &NewNotification {
            sender_user_id: Some(auth.caller.user_id),
            kind: kind::ANNOUNCEMENT,
            title: req.title.trim(),
            message: req.message.trim(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(DeliveryReport {
        recipients: recipients.len(),
        delivered_live,
    })))
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Paginated notifications: {success, count, pagination, data}", body = [NotificationResponse]),
    ),
    security(("bearer" = []))
)]
pub async fn list_notifications(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    query: web::Query<NotificationQuery>,
) -> AppResult<HttpResponse> {
    let params = PaginationParams::new(query.page, query.limit);
    let (rows, total) = pool
        .list_notifications(auth.caller.user_id, query.unread_only, &params)
        .await?;

    let data: Vec<NotificationResponse> =
        rows.into_iter().map(NotificationResponse::from).collect();
    Ok(HttpResponse::Ok().json(ListResponse::new(
        data,
        Pagination::from_params(&params, total),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{notification_id}/read",
    tag = "Notifications",
    params(("notification_id" = Uuid, Path, description = "Notification UUID")),
    responses(
        (status = 200, description = "Notification marked read, wrapped in {success, data}", body = NotificationResponse),
        (status = 404, description = "No such notification for this caller", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn mark_notification_read(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let updated = pool
        .mark_notification_read(path.into_inner(), auth.caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(NotificationResponse::from(updated))))
}
