//! Viewer-facing message representation and the clear watermark filter.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::message::Message;
use crate::datetime::format_timestamp;
use crate::db::UserIdentity;

/// A message as delivered to clients.
///
/// Sender and receiver are resolved identities. The text of a deleted
/// message is withheld.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub application_id: i64,
    pub job_id: i64,
    pub sender: UserIdentity,
    pub receiver: UserIdentity,
    pub text: Option<String>,
    pub reply_to_id: Option<i64>,
    pub reply_to: Option<ReplyPreview>,
    pub deleted: bool,
    pub created_at: String,
}

/// The message a reply points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyPreview {
    pub id: i64,
    pub sender_id: i64,
    pub text: Option<String>,
    pub deleted: bool,
}

impl ReplyPreview {
    fn of(target: &Message) -> Self {
        Self {
            id: target.id,
            sender_id: target.sender_id,
            text: visible_text(target),
            deleted: target.is_deleted,
        }
    }
}

fn visible_text(message: &Message) -> Option<String> {
    (!message.is_deleted).then(|| message.body.clone())
}

/// Build the client view of a message.
///
/// Returns None when the sender or receiver identity is unknown.
pub fn message_view(
    message: &Message,
    reply_target: Option<&Message>,
    identities: &HashMap<i64, UserIdentity>,
) -> Option<MessageView> {
    let sender = identities.get(&message.sender_id)?.clone();
    let receiver = identities.get(&message.receiver_id)?.clone();

    Some(MessageView {
        id: message.id,
        application_id: message.application_id,
        job_id: message.job_id,
        sender,
        receiver,
        text: visible_text(message),
        reply_to_id: message.reply_to_id,
        reply_to: reply_target.map(ReplyPreview::of),
        deleted: message.is_deleted,
        created_at: format_timestamp(&message.created_at),
    })
}

/// Messages created strictly after the viewer's watermark.
///
/// With no watermark every message is visible. Order is preserved.
pub fn visible_after(messages: &[Message], watermark: Option<DateTime<Utc>>) -> Vec<&Message> {
    match watermark {
        Some(mark) => messages.iter().filter(|m| m.created_at > mark).collect(),
        None => messages.iter().collect(),
    }
}

/// Build the ordered history a viewer sees.
///
/// Reply previews resolve against the whole conversation, so a reply to a
/// message hidden by the watermark still shows its target.
pub fn build_history(
    messages: &[Message],
    watermark: Option<DateTime<Utc>>,
    identities: &HashMap<i64, UserIdentity>,
) -> Vec<MessageView> {
    let by_id: HashMap<i64, &Message> = messages.iter().map(|m| (m.id, m)).collect();

    visible_after(messages, watermark)
        .into_iter()
        .filter_map(|message| {
            let target = message
                .reply_to_id
                .and_then(|id| by_id.get(&id).copied());
            message_view(message, target, identities)
        })
        .collect()
}
