use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures_util::StreamExt as _;
use qstring::QString;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{service::DbService, DbPool, User};
use crate::identity::IdentityProvider;
use crate::realtime::events::{ClientEvent, ServerEvent};
use crate::realtime::registry::EventSender;
use crate::realtime::{MessagingChannel, PresenceTracker, RealtimeError};

/// Realtime gateway: authenticates the handshake, admits the session into
/// the registry, and dispatches inbound events to the messaging channel.
/// The bearer credential travels in the `token` query parameter because
/// browsers cannot set headers on a websocket upgrade.
#[get("/ws")]
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    pool: web::Data<DbPool>,
    identity: web::Data<Arc<dyn IdentityProvider>>,
    presence: web::Data<PresenceTracker>,
    channel: web::Data<MessagingChannel>,
) -> Result<HttpResponse, Error> {
    let query = QString::from(req.query_string());
    let token = match query.get("token") {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Ok(HttpResponse::Unauthorized().body("Authentication required")),
    };

    let subject = match identity.verify_credential(&token).await {
        Ok(subject) => subject,
        Err(e) => {
            warn!("Socket auth error: {}", e);
            return Ok(HttpResponse::Unauthorized().body("Invalid token"));
        }
    };

    let user = {
        let conn = pool.lock().unwrap();
        match DbService::find_user_by_subject(&conn, &subject) {
            Ok(Some(user)) => user,
            Ok(None) => return Ok(HttpResponse::Unauthorized().body("User not found")),
            Err(e) => {
                error!("User lookup failed during handshake: {}", e);
                return Ok(HttpResponse::InternalServerError().finish());
            }
        }
    };

    let (response, session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let conn_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Forwarder: drains this connection's outbound queue into the socket.
    // The queue is FIFO, which is what preserves per-pair delivery order.
    let mut out_session = session.clone();
    actix_web::rt::spawn(async move {
        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to serialize server event: {}", e);
                    continue;
                }
            };
            if out_session.text(payload).await.is_err() {
                break;
            }
        }
    });

    presence.connected(&user, conn_id, tx.clone());
    info!(
        "WebSocket session established for {} ({} active)",
        user.username,
        presence.registry().session_count(user.id)
    );

    let mut session = session;
    actix_web::rt::spawn(async move {
        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                Message::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => handle_event(event, &user, &tx, &channel),
                    Err(e) => warn!("Dropping malformed client event: {}", e),
                },
                Message::Close(reason) => {
                    let _ = session.close(reason).await;
                    break;
                }
                _ => {}
            }
        }

        presence.disconnected(&user, conn_id);
        info!("WebSocket session closed for {}", user.username);
    });

    Ok(response)
}

fn handle_event(
    event: ClientEvent,
    user: &User,
    tx: &EventSender,
    channel: &MessagingChannel,
) {
    match event {
        ClientEvent::MessageSend {
            receiver_id,
            content,
        } => {
            let ack = match channel.send(user, receiver_id, &content) {
                Ok(message) => ServerEvent::ack_ok(message),
                Err(RealtimeError::Validation(reason)) => ServerEvent::ack_err(reason),
                Err(e) => {
                    error!("Message send error: {}", e);
                    ServerEvent::ack_err("Failed to send message")
                }
            };
            let _ = tx.send(ack);
        }
        ClientEvent::MessageRead { message_ids, .. } => {
            if let Err(e) = channel.mark_read(user.id, &message_ids) {
                error!("Message read error: {}", e);
            }
        }
        ClientEvent::TypingStart { receiver_id } => channel.typing_start(user, receiver_id),
        ClientEvent::TypingStop { receiver_id } => channel.typing_stop(user, receiver_id),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(ws_connect);
}
