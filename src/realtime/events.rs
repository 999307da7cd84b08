use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Message;

/// Events a connected client may send over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "message:send", rename_all = "camelCase")]
    MessageSend { receiver_id: Uuid, content: String },

    /// `sender_id` is what the original client protocol carried; the server
    /// derives the true senders from the store and ignores it for routing.
    #[serde(rename = "message:read", rename_all = "camelCase")]
    MessageRead {
        message_ids: Vec<i64>,
        #[serde(default)]
        sender_id: Option<Uuid>,
    },

    #[serde(rename = "typing:start", rename_all = "camelCase")]
    TypingStart { receiver_id: Uuid },

    #[serde(rename = "typing:stop", rename_all = "camelCase")]
    TypingStop { receiver_id: Uuid },
}

/// Events the server pushes to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:ack", rename_all = "camelCase")]
    MessageAck {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<Message>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "message:receive")]
    MessageReceive(Message),

    #[serde(rename = "message:read", rename_all = "camelCase")]
    MessageRead { message_ids: Vec<i64>, read_by: Uuid },

    #[serde(rename = "typing:start", rename_all = "camelCase")]
    TypingStart { user_id: Uuid, username: String },

    #[serde(rename = "typing:stop", rename_all = "camelCase")]
    TypingStop { user_id: Uuid },

    #[serde(rename = "user:online", rename_all = "camelCase")]
    UserOnline { user_id: Uuid, username: String },

    #[serde(rename = "user:offline", rename_all = "camelCase")]
    UserOffline { user_id: Uuid },
}

impl ServerEvent {
    pub fn ack_ok(message: Message) -> Self {
        ServerEvent::MessageAck {
            success: true,
            message: Some(message),
            error: None,
        }
    }

    pub fn ack_err(error: impl Into<String>) -> Self {
        ServerEvent::MessageAck {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}
