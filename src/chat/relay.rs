//! Real-time fan-out for application channels.
//!
//! Each connection registers a bounded queue. Publishing pushes into every
//! queue bound to the channel without waiting; a full or closed queue loses
//! the event.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use super::history::MessageView;

/// Event delivered to channel members.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A new message was stored.
    MessageReceived(MessageView),
    /// A message was deleted for everyone.
    MessageDeleted {
        message_id: i64,
        application_id: i64,
    },
    /// All messages of the application were removed.
    ChatCleared { application_id: i64 },
}

/// A connection's handle for channel membership.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    sender: mpsc::Sender<ChatEvent>,
}

impl ChatSession {
    /// Create a session with an outbound queue of `buffer` events.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let session = Self {
            id: format!("ws-{}", uuid::Uuid::new_v4()),
            sender,
        };
        (session, receiver)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Registry of channel bindings keyed by application ID.
///
/// Each channel maps session IDs to their outbound queues.
#[derive(Debug, Default)]
pub struct MessageRelay {
    channels: RwLock<HashMap<i64, HashMap<String, mpsc::Sender<ChatEvent>>>>,
}

impl MessageRelay {
    /// Create an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a session to an application's channel.
    ///
    /// Returns true if the session was not bound before.
    pub async fn bind(&self, application_id: i64, session: &ChatSession) -> bool {
        let mut channels = self.channels.write().await;
        let members = channels.entry(application_id).or_default();
        let previous = members.insert(session.id.clone(), session.sender.clone());
        debug!(
            application_id,
            session_id = %session.id,
            members = members.len(),
            "Session bound to channel"
        );
        previous.is_none()
    }

    /// Unbind a session from one channel.
    pub async fn unbind(&self, application_id: i64, session_id: &str) -> bool {
        let mut channels = self.channels.write().await;
        let Some(members) = channels.get_mut(&application_id) else {
            return false;
        };
        let removed = members.remove(session_id).is_some();
        if members.is_empty() {
            channels.remove(&application_id);
        }
        removed
    }

    /// Unbind a session from every channel.
    ///
    /// Returns the number of channels it left.
    pub async fn unbind_all(&self, session_id: &str) -> usize {
        let mut channels = self.channels.write().await;
        let mut left = 0;
        channels.retain(|_, members| {
            if members.remove(session_id).is_some() {
                left += 1;
            }
            !members.is_empty()
        });
        left
    }

    /// Deliver an event to every session bound to the channel.
    ///
    /// Never waits on a slow session. Returns the number of sessions the
    /// event was queued for.
    pub async fn publish(&self, application_id: i64, event: ChatEvent) -> usize {
        let channels = self.channels.read().await;
        let Some(members) = channels.get(&application_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (session_id, sender) in members {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(application_id, %session_id, "Session queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(application_id, %session_id, "Session closed, event dropped");
                }
            }
        }
        delivered
    }

    /// Number of sessions bound to a channel.
    pub async fn member_count(&self, application_id: i64) -> usize {
        self.channels
            .read()
            .await
            .get(&application_id)
            .map_or(0, HashMap::len)
    }
}
