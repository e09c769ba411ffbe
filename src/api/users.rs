//! User account endpoints.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::SessionAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, CreateUserRequest, Role, UserResponse};

/// Configure user routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users/me").route(web::get().to(get_me)))
        .service(web::resource("/users").route(web::post().to(create_user)));
}

/// Create a user account (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created, wrapped in {success, data}", body = UserResponse),
        (status = 400, description = "Invalid input or duplicate email", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_user(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    auth.caller.require_role(&[Role::Admin])?;

    let req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let user = pool.insert_user(&req.name, &req.email, req.role).await?;
    info!(user_id = %user.id, role = %user.role, "User created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(UserResponse::from(user))))
}

/// The caller's own account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Caller's user record, wrapped in {success, data}", body = UserResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 404, description = "User no longer exists", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_me(auth: SessionAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let user = pool
        .get_user_by_id(auth.caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserResponse::from(user))))
}
