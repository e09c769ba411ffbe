//! API endpoint modules.

pub mod exams;
pub mod grades;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod records;
pub mod users;
pub mod websocket;

use actix_web::{HttpRequest, web};

use crate::error::AppError;

pub use exams::configure_routes as configure_exam_routes;
pub use grades::configure_routes as configure_grade_routes;
pub use health::configure_health_routes;
pub use notifications::configure_routes as configure_notification_routes;
pub use openapi::ApiDoc;
pub use records::configure_routes as configure_record_routes;
pub use users::configure_routes as configure_user_routes;
pub use websocket::configure_routes as configure_websocket_routes;

/// Register every `/api/v1` route. More specific paths come first.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_user_routes)
        .configure(configure_record_routes)
        .configure(configure_exam_routes)
        .configure(configure_grade_routes)
        .configure(configure_notification_routes);
}

/// Malformed JSON bodies (including unknown fields) become 400 envelopes.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err, _req: &HttpRequest| {
            AppError::InvalidInput(format!("Invalid request body: {}", err)).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::InvalidInput(format!("Invalid query string: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::InvalidInput(format!("Invalid path parameter: {}", err)).into()
    })
}
