use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{service::DbService, DbPool, Message, User};
use crate::realtime::events::ServerEvent;
use crate::realtime::registry::SessionRegistry;
use crate::realtime::RealtimeError;

/// Point-to-point chat delivery between registered sessions, with
/// store-and-forward durability behind it.
#[derive(Clone)]
pub struct MessagingChannel {
    registry: Arc<SessionRegistry>,
    pool: DbPool,
}

impl MessagingChannel {
    pub fn new(registry: Arc<SessionRegistry>, pool: DbPool) -> Self {
        Self { registry, pool }
    }

    /// Persist a message, then fan it out to the receiver's live sessions.
    /// The persisted message is returned to the sender as the ack whether or
    /// not the receiver is online; offline receivers pick it up from history.
    pub fn send(
        &self,
        sender: &User,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, RealtimeError> {
        let content = content.trim();
        if content.is_empty() || receiver_id.is_nil() {
            return Err(RealtimeError::Validation(
                "Receiver ID and content are required".to_string(),
            ));
        }

        // Durability before delivery: the row must exist before any session
        // observes the receive event.
        let message = {
            let conn = self.pool.lock().unwrap();
            DbService::insert_message(&conn, sender, receiver_id, content)?
        };

        self.registry
            .send_to_user(receiver_id, ServerEvent::MessageReceive(message.clone()));

        Ok(message)
    }

    /// Flip read flags scoped to the reader's inbox, then echo a read
    /// receipt to every session of each message's original sender so their
    /// other devices can sync read state.
    pub fn mark_read(&self, reader_id: Uuid, message_ids: &[i64]) -> Result<(), RealtimeError> {
        if message_ids.is_empty() {
            return Ok(());
        }

        let flipped = {
            let conn = self.pool.lock().unwrap();
            DbService::mark_read(&conn, reader_id, message_ids)?
        };

        let mut by_sender: HashMap<Uuid, Vec<i64>> = HashMap::new();
        for (id, sender_id) in flipped {
            by_sender.entry(sender_id).or_default().push(id);
        }

        for (sender_id, ids) in by_sender {
            self.registry.send_to_user(
                sender_id,
                ServerEvent::MessageRead {
                    message_ids: ids,
                    read_by: reader_id,
                },
            );
        }

        Ok(())
    }

    /// Fire-and-forget typing indicator. Dropped silently when the recipient
    /// has no live session.
    pub fn typing_start(&self, from: &User, to: Uuid) {
        self.registry.send_to_user(
            to,
            ServerEvent::TypingStart {
                user_id: from.id,
                username: from.username.clone(),
            },
        );
    }

    pub fn typing_stop(&self, from: &User, to: Uuid) {
        self.registry
            .send_to_user(to, ServerEvent::TypingStop { user_id: from.id });
    }
}
