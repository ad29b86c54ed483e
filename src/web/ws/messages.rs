//! Real-time channel frames.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatEvent, MessageView};

/// Frames sent from client to server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this connection to an application's channel.
    Join {
        #[serde(default)]
        token: Option<String>,
        application_id: i64,
    },
    /// Store and relay a message.
    Send {
        #[serde(default)]
        token: Option<String>,
        application_id: i64,
        text: String,
        #[serde(default)]
        reply_to: Option<i64>,
    },
    /// Unbind from one channel.
    Leave { application_id: i64 },
    /// Heartbeat.
    Ping,
}

/// Frames sent from server to client.
///
/// Refused operations produce no frame at all.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    MessageReceived {
        message: MessageView,
    },
    MessageDeleted {
        message_id: i64,
        application_id: i64,
    },
    ChatCleared {
        application_id: i64,
    },
    Pong,
}

impl From<ChatEvent> for ServerMessage {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::MessageReceived(message) => ServerMessage::MessageReceived { message },
            ChatEvent::MessageDeleted {
                message_id,
                application_id,
            } => ServerMessage::MessageDeleted {
                message_id,
                application_id,
            },
            ChatEvent::ChatCleared { application_id } => {
                ServerMessage::ChatCleared { application_id }
            }
        }
    }
}
