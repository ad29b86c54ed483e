//! Chat module for HireOn.
//!
//! This module provides the per-application chat between an applicant and
//! the recruiter who owns the job:
//! - Channel admission (accepted applications, participants only)
//! - Message storage with reply references and tombstones
//! - Real-time fan-out to every connected session of a channel
//! - Viewer-filtered history with per-user clear watermarks

pub mod admission;
mod history;
mod message;
mod relay;
mod service;

use serde::{Deserialize, Serialize};

pub use admission::{Admission, AdmissionError, Identity, IdentityVerifier};
pub use history::{build_history, message_view, visible_after, MessageView, ReplyPreview};
pub use message::{Message, MessageRepository, NewMessage};
pub use relay::{ChatEvent, ChatSession, MessageRelay};
pub use service::{ChatService, DeleteOutcome};

/// Who may delete a message for everyone.
///
/// The superadmin may always delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Only the message's sender.
    #[default]
    Sender,
    /// Either participant of the application.
    Participant,
    /// Any signed-in user.
    AnyAuthenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_policy_names() {
        assert_eq!(
            serde_json::to_value(DeletePolicy::AnyAuthenticated).unwrap(),
            "any_authenticated"
        );
        let policy: DeletePolicy = serde_json::from_str("\"participant\"").unwrap();
        assert_eq!(policy, DeletePolicy::Participant);
        assert_eq!(DeletePolicy::default(), DeletePolicy::Sender);
    }
}
