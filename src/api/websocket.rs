//! Live notification socket.
//!
//! Clients authenticate with the same session token as the REST API, either
//! as `?token=<jwt>` (browsers cannot set headers on a socket) or as an
//! `Authorization: Bearer` header. Authentication happens before the
//! upgrade so a bad token gets a plain 401 instead of an open socket.

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{SessionKeys, bearer_token};
use crate::error::ErrorResponse;
use crate::services::BroadcastEmitter;

/// Ping interval for keeping connections alive.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for receiving pong response.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Deserialize)]
struct SocketAuthQuery {
    token: Option<String>,
}

fn socket_token(req: &HttpRequest) -> Option<String> {
    web::Query::<SocketAuthQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().token)
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(req).map(str::to_string))
}

/// Authenticate, then upgrade to a socket carrying the caller's events.
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    emitter: web::Data<BroadcastEmitter>,
    keys: web::Data<SessionKeys>,
) -> Result<HttpResponse, actix_web::Error> {
    let client_addr = req
        .connection_info()
        .realip_remote_addr()
        .map(String::from)
        .unwrap_or_else(|| "unknown".to_string());

    let verified = match socket_token(&req) {
        Some(token) => keys.verify(&token),
        None => Err("Missing session token".to_string()),
    };
    let caller = match verified {
        Ok(caller) => caller,
        Err(message) => {
            warn!(client = %client_addr, "WebSocket authentication failed");
            return Ok(HttpResponse::Unauthorized().json(ErrorResponse::new("UNAUTHORIZED", message)));
        }
    };

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    info!(
        client = %client_addr,
        user_id = %caller.user_id,
        role = %caller.role,
        "WebSocket connection established"
    );

    actix_web::rt::spawn(handle_websocket_connection(
        session,
        msg_stream,
        emitter.get_ref().clone(),
        caller.user_id,
        client_addr,
    ));

    Ok(response)
}

async fn handle_websocket_connection(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    emitter: BroadcastEmitter,
    user_id: Uuid,
    client_addr: String,
) {
    let mut subscription = emitter.subscribe(user_id);

    let mut last_pong = Instant::now();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);

    loop {
        tokio::select! {
            Some(msg_result) = msg_stream.next() => {
                match msg_result {
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_pong = Instant::now();
                    }
                    Ok(Message::Text(text)) => {
                        // Clients have nothing to send yet
                        debug!(client = %client_addr, message = %text, "Ignoring client message");
                    }
                    Ok(Message::Close(reason)) => {
                        info!(client = %client_addr, reason = ?reason, "Client requested close");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(client = %client_addr, error = %e, "WebSocket message error");
                        break;
                    }
                }
            }

            event_result = subscription.recv() => {
                match event_result {
                    Ok(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if session.text(json).await.is_err() {
                                    warn!(client = %client_addr, "Failed to send event, closing connection");
                                    break;
                                }
                            }
                            Err(e) => warn!(error = %e, "Failed to serialize event"),
                        }
                    }
                    Err(RecvError::Lagged(count)) => {
                        // Missed events stay readable via GET /notifications
                        warn!(client = %client_addr, missed = count, "Client lagged, missed events");
                    }
                    Err(RecvError::Closed) => {
                        info!(client = %client_addr, "Notification channel closed");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if last_pong.elapsed() > PING_INTERVAL + PONG_TIMEOUT {
                    warn!(client = %client_addr, "Pong timeout, closing connection");
                    break;
                }
                if session.ping(b"").await.is_err() {
                    warn!(client = %client_addr, "Failed to send ping, closing connection");
                    break;
                }
            }
        }
    }

    drop(subscription);
    let _ = session.close(None).await;
    info!(client = %client_addr, user_id = %user_id, "WebSocket connection closed");
}

/// Configure WebSocket routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(websocket_handler)));
}
