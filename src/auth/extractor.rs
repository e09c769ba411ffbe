//! Actix-web extractor for bearer session tokens.
//!
//! # Security
//! - The raw token is never logged
//! - Failures carry the same 401 envelope as other errors

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use std::future::{Ready, ready};

use super::{Caller, SessionKeys};
use crate::error::ErrorResponse;

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED)
            .json(ErrorResponse::new("UNAUTHORIZED", self.message.clone()))
    }
}

/// Extractor that requires a valid session token.
///
/// ```ignore
/// async fn handler(auth: SessionAuth) -> impl Responder {
///     // auth.caller.user_id, auth.caller.role
/// }
/// ```
pub struct SessionAuth {
    pub caller: Caller,
}

impl FromRequest for SessionAuth {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let keys = match req.app_data::<web::Data<SessionKeys>>() {
            Some(keys) => keys,
            None => {
                return ready(Err(AuthError::new("Internal configuration error")));
            }
        };

        let token = match bearer_token(req) {
            Some(token) => token,
            None => {
                return ready(Err(AuthError::new(
                    "Missing session token. Provide Authorization: Bearer <token>.",
                )));
            }
        };

        ready(
            keys.verify(token)
                .map(|caller| SessionAuth { caller })
                .map_err(AuthError::new),
        )
    }
}
