//! Chat service for HireOn.
//!
//! Real-time operations (`join`, `send`, `leave`) never report why they
//! failed; the reason is logged at debug level and the operation is
//! dropped. Request/response operations return typed errors.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::admission::{self, Identity, IdentityVerifier};
use super::history::{build_history, message_view, MessageView};
use super::message::{MessageRepository, NewMessage};
use super::relay::{ChatEvent, ChatSession, MessageRelay};
use super::DeletePolicy;
use crate::application::{ApplicationRepository, ChatEnabledApplication};
use crate::config::ChatConfig;
use crate::db::{DbPool, UserRepository};
use crate::{HireonError, Result};

/// Outcome of a delete-for-everyone request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The message was tombstoned and the channel notified.
    Deleted { application_id: i64 },
    /// The message was already deleted.
    AlreadyDeleted { application_id: i64 },
}

/// Chat operations over the message store and the relay.
#[derive(Clone)]
pub struct ChatService {
    pool: DbPool,
    relay: Arc<MessageRelay>,
    verifier: Arc<dyn IdentityVerifier>,
    config: ChatConfig,
}

impl ChatService {
    /// Create a chat service.
    pub fn new(
        pool: DbPool,
        relay: Arc<MessageRelay>,
        verifier: Arc<dyn IdentityVerifier>,
        config: ChatConfig,
    ) -> Self {
        Self {
            pool,
            relay,
            verifier,
            config,
        }
    }

    /// The relay this service publishes to.
    pub fn relay(&self) -> &Arc<MessageRelay> {
        &self.relay
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Open a session for a new real-time connection.
    pub fn open_session(&self) -> (ChatSession, mpsc::Receiver<ChatEvent>) {
        ChatSession::new(self.config.session_buffer)
    }

    /// Bind a session to an application's channel.
    ///
    /// Returns false, without any other effect, if admission fails.
    pub async fn join(&self, session: &ChatSession, token: Option<&str>, application_id: i64) -> bool {
        match admission::admit_token(&self.pool, self.verifier.as_ref(), token, application_id).await
        {
            Ok((admission, _)) => {
                self.relay.bind(application_id, session).await;
                debug!(
                    application_id,
                    session_id = %session.id(),
                    user_id = admission.user_id,
                    role = ?admission.role,
                    "Session joined channel"
                );
                true
            }
            Err(e) => {
                debug!(application_id, session_id = %session.id(), reason = %e, "Join dropped");
                false
            }
        }
    }

    /// Leave one channel.
    pub async fn leave(&self, session: &ChatSession, application_id: i64) -> bool {
        self.relay.unbind(application_id, session.id()).await
    }

    /// Tear down a connection's channel bindings.
    pub async fn disconnect(&self, session: &ChatSession) {
        let left = self.relay.unbind_all(session.id()).await;
        debug!(session_id = %session.id(), channels = left, "Session disconnected");
    }

    /// Store a message and fan it out to the channel.
    ///
    /// Admission is re-checked on every send and the receiver is computed
    /// from the application's current state. Returns the delivered view, or
    /// None if the send was dropped.
    pub async fn send(
        &self,
        token: Option<&str>,
        application_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Option<MessageView> {
        let admission = match admission::admit_token(
            &self.pool,
            self.verifier.as_ref(),
            token,
            application_id,
        )
        .await
        {
            Ok((admission, _)) => admission,
            Err(e) => {
                debug!(application_id, reason = %e, "Send dropped");
                return None;
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.chars().count() > self.config.max_message_length {
            debug!(application_id, "Send dropped: invalid message length");
            return None;
        }

        match self
            .store_and_publish(&admission, text, reply_to)
            .await
        {
            Ok(view) => view,
            Err(e) => {
                warn!(application_id, error = %e, "Send dropped: persistence failure");
                None
            }
        }
    }

    async fn store_and_publish(
        &self,
        admission: &admission::Admission,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Option<MessageView>> {
        let messages = MessageRepository::new(&self.pool);

        let reply_target = match reply_to {
            Some(id) => match messages.get_by_id(id).await? {
                Some(target) if target.application_id == admission.application_id => Some(target),
                _ => {
                    debug!(
                        application_id = admission.application_id,
                        reply_to = id,
                        "Send dropped: reply target not in this chat"
                    );
                    return Ok(None);
                }
            },
            None => None,
        };

        let message = messages
            .create(
                &NewMessage::new(
                    admission.application_id,
                    admission.job_id,
                    admission.user_id,
                    admission.counterpart_id,
                    text,
                )
                .reply_to(reply_to),
            )
            .await?;

        let identities = UserRepository::new(&self.pool)
            .identities(&[message.sender_id, message.receiver_id])
            .await?;
        let Some(view) = message_view(&message, reply_target.as_ref(), &identities) else {
            return Err(HireonError::NotFound("participant".to_string()));
        };

        let delivered = self
            .relay
            .publish(
                admission.application_id,
                ChatEvent::MessageReceived(view.clone()),
            )
            .await;
        debug!(
            application_id = admission.application_id,
            message_id = message.id,
            delivered,
            "Message relayed"
        );

        Ok(Some(view))
    }

    /// Viewer-filtered history of an application, oldest first.
    pub async fn history(&self, user_id: i64, application_id: i64) -> Result<Vec<MessageView>> {
        let (_, ctx) = admission::admit(&self.pool, user_id, application_id).await?;

        let messages = MessageRepository::new(&self.pool)
            .list_by_application(application_id)
            .await?;

        let mut user_ids: Vec<i64> = messages
            .iter()
            .flat_map(|m| [m.sender_id, m.receiver_id])
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let identities: HashMap<_, _> = UserRepository::new(&self.pool)
            .identities(&user_ids)
            .await?;

        Ok(build_history(
            &messages,
            ctx.watermark_for(user_id),
            &identities,
        ))
    }

    /// Hide everything currently in the chat from `user_id`'s history.
    ///
    /// Either participant may clear, whatever the application status.
    /// Returns the new watermark.
    pub async fn clear_for_me(&self, user_id: i64, application_id: i64) -> Result<DateTime<Utc>> {
        let applications = ApplicationRepository::new(&self.pool);
        let ctx = applications
            .get_context(application_id)
            .await?
            .ok_or_else(|| HireonError::NotFound("application".to_string()))?;

        if ctx.participant_role(user_id).is_none() {
            return Err(HireonError::Permission(
                "not a participant of this application".to_string(),
            ));
        }

        let cleared_at = Utc::now().trunc_subsecs(6);
        applications
            .upsert_clear_mark(application_id, user_id, cleared_at)
            .await?;

        info!(application_id, user_id, "Chat cleared for user");
        Ok(cleared_at)
    }

    /// Permanently remove every message of an application.
    ///
    /// Allowed to admitted participants and to the superadmin. Returns the
    /// number of messages removed.
    pub async fn clear_all(&self, identity: &Identity, application_id: i64) -> Result<usize> {
        if identity.is_superadmin() {
            ApplicationRepository::new(&self.pool)
                .get_context(application_id)
                .await?
                .ok_or_else(|| HireonError::NotFound("application".to_string()))?;
        } else {
            admission::admit(&self.pool, identity.user_id, application_id).await?;
        }

        let removed = MessageRepository::new(&self.pool)
            .delete_by_application(application_id)
            .await?;
        self.relay
            .publish(application_id, ChatEvent::ChatCleared { application_id })
            .await;

        info!(
            application_id,
            user_id = identity.user_id,
            removed,
            "Chat history cleared for everyone"
        );
        Ok(removed)
    }

    /// Delete a message for everyone, subject to the configured policy.
    pub async fn delete_message(
        &self,
        identity: &Identity,
        message_id: i64,
    ) -> Result<DeleteOutcome> {
        let messages = MessageRepository::new(&self.pool);
        let message = messages
            .get_by_id(message_id)
            .await?
            .ok_or_else(|| HireonError::NotFound("message".to_string()))?;
        let application_id = message.application_id;

        if !self.may_delete(identity, message.sender_id, application_id).await? {
            return Err(HireonError::Permission(
                "not allowed to delete this message".to_string(),
            ));
        }

        if !messages.mark_deleted(message_id).await? {
            return Ok(DeleteOutcome::AlreadyDeleted { application_id });
        }

        self.relay
            .publish(
                application_id,
                ChatEvent::MessageDeleted {
                    message_id,
                    application_id,
                },
            )
            .await;

        info!(
            message_id,
            application_id,
            user_id = identity.user_id,
            "Message deleted for everyone"
        );
        Ok(DeleteOutcome::Deleted { application_id })
    }

    async fn may_delete(
        &self,
        identity: &Identity,
        sender_id: i64,
        application_id: i64,
    ) -> Result<bool> {
        if identity.is_superadmin() {
            return Ok(true);
        }
        match self.config.delete_policy {
            DeletePolicy::Sender => Ok(identity.user_id == sender_id),
            DeletePolicy::Participant => Ok(ApplicationRepository::new(&self.pool)
                .get_context(application_id)
                .await?
                .is_some_and(|ctx| ctx.participant_role(identity.user_id).is_some())),
            DeletePolicy::AnyAuthenticated => Ok(true),
        }
    }

    /// Accepted applications the user can chat on.
    pub async fn chat_enabled_applications(
        &self,
        user_id: i64,
    ) -> Result<Vec<ChatEnabledApplication>> {
        ApplicationRepository::new(&self.pool)
            .list_chat_enabled(user_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ApplicationStatus, JobRepository, NewJob};
    use crate::db::{Database, NewUser, Role};

    /// Accepts tokens of the form `user-<id>`.
    struct TestVerifier;

    impl IdentityVerifier for TestVerifier {
        fn verify(&self, token: &str) -> Option<Identity> {
            let user_id = token.strip_prefix("user-")?.parse().ok()?;
            Some(Identity {
                user_id,
                role: Role::Student,
            })
        }
    }

    fn token(user_id: i64) -> String {
        format!("user-{user_id}")
    }

    struct Fixture {
        db: Database,
        service: ChatService,
        student: i64,
        recruiter: i64,
        outsider: i64,
        job: i64,
        app: i64,
    }

    async fn setup_with(policy: DeletePolicy) -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let student = users
            .create(&NewUser::new("Sam", "sam@example.com", "hash"))
            .await
            .unwrap()
            .id;
        let recruiter = users
            .create(&NewUser::new("Rita", "rita@example.com", "hash").with_role(Role::Recruiter))
            .await
            .unwrap()
            .id;
        let outsider = users
            .create(&NewUser::new("Olly", "olly@example.com", "hash"))
            .await
            .unwrap()
            .id;
        let job = JobRepository::new(db.pool())
            .create(&NewJob::new("Backend Engineer", recruiter))
            .await
            .unwrap()
            .id;
        let applications = ApplicationRepository::new(db.pool());
        let app = applications.create(job, student).await.unwrap().id;
        applications
            .set_status(app, ApplicationStatus::Accepted)
            .await
            .unwrap();

        let config = ChatConfig {
            delete_policy: policy,
            ..ChatConfig::default()
        };
        let service = ChatService::new(
            db.pool().clone(),
            Arc::new(MessageRelay::new()),
            Arc::new(TestVerifier),
            config,
        );

        Fixture {
            db,
            service,
            student,
            recruiter,
            outsider,
            job,
            app,
        }
    }

    async fn setup() -> Fixture {
        setup_with(DeletePolicy::Sender).await
    }

    fn identity(user_id: i64) -> Identity {
        Identity {
            user_id,
            role: Role::Student,
        }
    }

    async fn pause() {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn test_join_requires_participant() {
        let f = setup().await;
        let (session, _rx) = f.service.open_session();

        assert!(!f.service.join(&session, None, f.app).await);
        assert!(!f.service.join(&session, Some("bogus"), f.app).await);
        assert!(!f.service.join(&session, Some(&token(f.outsider)), f.app).await);
        assert!(!f.service.join(&session, Some(&token(f.student)), 9999).await);
        assert_eq!(f.service.relay().member_count(f.app).await, 0);

        assert!(f.service.join(&session, Some(&token(f.student)), f.app).await);
        assert!(f.service.join(&session, Some(&token(f.recruiter)), f.app).await);
        assert_eq!(f.service.relay().member_count(f.app).await, 1);
    }

    #[tokio::test]
    async fn test_no_join_or_send_unless_accepted() {
        let f = setup().await;
        let applications = ApplicationRepository::new(f.db.pool());

        for status in [ApplicationStatus::Pending, ApplicationStatus::Rejected] {
            applications.set_status(f.app, status).await.unwrap();
            let (session, mut rx) = f.service.open_session();

            assert!(!f.service.join(&session, Some(&token(f.student)), f.app).await);
            assert!(!f.service.join(&session, Some(&token(f.recruiter)), f.app).await);
            assert!(f
                .service
                .send(Some(&token(f.student)), f.app, "hello", None)
                .await
                .is_none());
            assert!(rx.try_recv().is_err());
        }

        let count = MessageRepository::new(f.db.pool())
            .count_by_application(f.app)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_send_fans_out_to_all_sessions() {
        let f = setup().await;
        let (s_phone, mut rx_phone) = f.service.open_session();
        let (s_laptop, mut rx_laptop) = f.service.open_session();
        let (r_session, mut rx_r) = f.service.open_session();
        f.service.join(&s_phone, Some(&token(f.student)), f.app).await;
        f.service.join(&s_laptop, Some(&token(f.student)), f.app).await;
        f.service.join(&r_session, Some(&token(f.recruiter)), f.app).await;

        let view = f
            .service
            .send(Some(&token(f.student)), f.app, "Hello", None)
            .await
            .unwrap();
        assert_eq!(view.sender.id, f.student);
        assert_eq!(view.receiver.id, f.recruiter);
        assert_eq!(view.text.as_deref(), Some("Hello"));
        assert!(!view.deleted);

        for rx in [&mut rx_phone, &mut rx_laptop, &mut rx_r] {
            assert_eq!(rx.try_recv().unwrap(), ChatEvent::MessageReceived(view.clone()));
        }
    }

    #[tokio::test]
    async fn test_send_rechecks_admission() {
        let f = setup().await;
        let (session, mut rx) = f.service.open_session();
        assert!(f.service.join(&session, Some(&token(f.student)), f.app).await);

        ApplicationRepository::new(f.db.pool())
            .set_status(f.app, ApplicationStatus::Rejected)
            .await
            .unwrap();

        assert!(f
            .service
            .send(Some(&token(f.student)), f.app, "still there?", None)
            .await
            .is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_drops_bad_input() {
        let f = setup().await;
        let student = token(f.student);

        assert!(f.service.send(Some(&student), f.app, "   ", None).await.is_none());
        let too_long = "x".repeat(f.service.config().max_message_length + 1);
        assert!(f.service.send(Some(&student), f.app, &too_long, None).await.is_none());
        assert!(f.service.send(Some(&token(f.outsider)), f.app, "hi", None).await.is_none());
        assert!(f.service.send(Some(&student), f.app, "hi", Some(9999)).await.is_none());
    }

    #[tokio::test]
    async fn test_send_stores_text_as_sent() {
        let f = setup().await;
        let student = token(f.student);

        let view = f
            .service
            .send(Some(&student), f.app, "  see you at 9\n", None)
            .await
            .unwrap();
        assert_eq!(view.text.as_deref(), Some("  see you at 9\n"));

        // Padding does not count against the length limit.
        let padded = format!(" {} ", "x".repeat(f.service.config().max_message_length));
        assert!(f.service.send(Some(&student), f.app, &padded, None).await.is_some());

        let history = f.service.history(f.recruiter, f.app).await.unwrap();
        assert_eq!(history[0].text.as_deref(), Some("  see you at 9\n"));
        assert_eq!(history[1].text.as_deref(), Some(padded.as_str()));
    }

    #[tokio::test]
    async fn test_receiver_follows_job_transfer() {
        let f = setup().await;
        let new_owner = UserRepository::new(f.db.pool())
            .create(&NewUser::new("Nina", "nina@example.com", "hash").with_role(Role::Recruiter))
            .await
            .unwrap()
            .id;

        let before = f
            .service
            .send(Some(&token(f.student)), f.app, "before", None)
            .await
            .unwrap();
        assert_eq!(before.receiver.id, f.recruiter);

        JobRepository::new(f.db.pool())
            .transfer(f.job, new_owner)
            .await
            .unwrap();

        let after = f
            .service
            .send(Some(&token(f.student)), f.app, "after", None)
            .await
            .unwrap();
        assert_eq!(after.receiver.id, new_owner);
        assert!(f
            .service
            .send(Some(&token(f.recruiter)), f.app, "hello?", None)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_history_with_reply() {
        let f = setup().await;
        let hello = f
            .service
            .send(Some(&token(f.student)), f.app, "Hello", None)
            .await
            .unwrap();
        pause().await;
        f.service
            .send(Some(&token(f.recruiter)), f.app, "Hi there", Some(hello.id))
            .await
            .unwrap();

        let history = f.service.history(f.student, f.app).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, hello.id);
        assert_eq!(history[1].text.as_deref(), Some("Hi there"));
        assert_eq!(history[1].reply_to_id, Some(hello.id));
    }

    #[tokio::test]
    async fn test_history_requires_admission() {
        let f = setup().await;
        assert!(matches!(
            f.service.history(f.outsider, f.app).await,
            Err(HireonError::Permission(_))
        ));
        assert!(matches!(
            f.service.history(f.student, 9999).await,
            Err(HireonError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_for_me_scenario() {
        let f = setup().await;
        let hello = f
            .service
            .send(Some(&token(f.student)), f.app, "Hello", None)
            .await
            .unwrap();
        pause().await;
        f.service
            .send(Some(&token(f.recruiter)), f.app, "Hi there", Some(hello.id))
            .await
            .unwrap();
        pause().await;

        f.service.clear_for_me(f.student, f.app).await.unwrap();
        pause().await;

        let third = f
            .service
            .send(Some(&token(f.recruiter)), f.app, "Third", None)
            .await
            .unwrap();

        let for_student = f.service.history(f.student, f.app).await.unwrap();
        assert_eq!(for_student.len(), 1);
        assert_eq!(for_student[0].id, third.id);
        assert_eq!(f.service.history(f.student, f.app).await.unwrap(), for_student);

        let for_recruiter = f.service.history(f.recruiter, f.app).await.unwrap();
        assert_eq!(for_recruiter.len(), 3);
    }

    #[tokio::test]
    async fn test_clear_for_me_replaces_watermark() {
        let f = setup().await;
        let first = f.service.clear_for_me(f.student, f.app).await.unwrap();
        pause().await;
        let msg = f
            .service
            .send(Some(&token(f.recruiter)), f.app, "between", None)
            .await
            .unwrap();
        pause().await;
        let second = f.service.clear_for_me(f.student, f.app).await.unwrap();
        assert!(second > first);

        let marks = ApplicationRepository::new(f.db.pool())
            .list_clear_marks(f.app)
            .await
            .unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].cleared_at, second);

        let history = f.service.history(f.student, f.app).await.unwrap();
        assert!(history.iter().all(|m| m.id != msg.id));
    }

    #[tokio::test]
    async fn test_clear_for_me_authorization() {
        let f = setup().await;
        assert!(matches!(
            f.service.clear_for_me(f.outsider, f.app).await,
            Err(HireonError::Permission(_))
        ));
        assert!(matches!(
            f.service.clear_for_me(f.student, 9999).await,
            Err(HireonError::NotFound(_))
        ));

        ApplicationRepository::new(f.db.pool())
            .set_status(f.app, ApplicationStatus::Rejected)
            .await
            .unwrap();
        assert!(f.service.clear_for_me(f.recruiter, f.app).await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let f = setup().await;
        let (session, mut rx) = f.service.open_session();
        f.service.join(&session, Some(&token(f.recruiter)), f.app).await;

        f.service
            .send(Some(&token(f.student)), f.app, "one", None)
            .await
            .unwrap();
        f.service.clear_for_me(f.student, f.app).await.unwrap();
        let _ = rx.try_recv();

        assert!(matches!(
            f.service.clear_all(&identity(f.outsider), f.app).await,
            Err(HireonError::Permission(_))
        ));

        assert_eq!(f.service.clear_all(&identity(f.recruiter), f.app).await.unwrap(), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::ChatCleared {
                application_id: f.app
            }
        );
        assert!(f.service.history(f.student, f.app).await.unwrap().is_empty());
        assert!(f.service.history(f.recruiter, f.app).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_by_superadmin() {
        let f = setup().await;
        f.service
            .send(Some(&token(f.student)), f.app, "one", None)
            .await
            .unwrap();

        let admin = Identity {
            user_id: f.outsider,
            role: Role::SuperAdmin,
        };
        assert_eq!(f.service.clear_all(&admin, f.app).await.unwrap(), 1);
        assert!(matches!(
            f.service.clear_all(&admin, 9999).await,
            Err(HireonError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_sender() {
        let f = setup().await;
        let (session, mut rx) = f.service.open_session();
        f.service.join(&session, Some(&token(f.recruiter)), f.app).await;

        let hello = f
            .service
            .send(Some(&token(f.student)), f.app, "Hello", None)
            .await
            .unwrap();
        let _ = rx.try_recv();

        assert!(matches!(
            f.service.delete_message(&identity(f.recruiter), hello.id).await,
            Err(HireonError::Permission(_))
        ));
        assert!(matches!(
            f.service.delete_message(&identity(f.student), 9999).await,
            Err(HireonError::NotFound(_))
        ));

        let outcome = f
            .service
            .delete_message(&identity(f.student), hello.id)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted { application_id: f.app });
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::MessageDeleted {
                message_id: hello.id,
                application_id: f.app
            }
        );

        let again = f
            .service
            .delete_message(&identity(f.student), hello.id)
            .await
            .unwrap();
        assert_eq!(again, DeleteOutcome::AlreadyDeleted { application_id: f.app });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_participant_policy() {
        let f = setup_with(DeletePolicy::Participant).await;
        let hello = f
            .service
            .send(Some(&token(f.student)), f.app, "Hello", None)
            .await
            .unwrap();

        assert!(matches!(
            f.service.delete_message(&identity(f.outsider), hello.id).await,
            Err(HireonError::Permission(_))
        ));
        assert!(f
            .service
            .delete_message(&identity(f.recruiter), hello.id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_by_any_caller_keeps_reply_placeholder() {
        let f = setup_with(DeletePolicy::AnyAuthenticated).await;
        let (s_session, mut rx_s) = f.service.open_session();
        let (r_session, mut rx_r) = f.service.open_session();
        f.service.join(&s_session, Some(&token(f.student)), f.app).await;
        f.service.join(&r_session, Some(&token(f.recruiter)), f.app).await;

        let hello = f
            .service
            .send(Some(&token(f.student)), f.app, "Hello", None)
            .await
            .unwrap();
        pause().await;
        f.service
            .send(Some(&token(f.recruiter)), f.app, "Hi there", Some(hello.id))
            .await
            .unwrap();
        for rx in [&mut rx_s, &mut rx_r] {
            while rx.try_recv().is_ok() {}
        }

        f.service
            .delete_message(&identity(f.outsider), hello.id)
            .await
            .unwrap();

        let notice = ChatEvent::MessageDeleted {
            message_id: hello.id,
            application_id: f.app,
        };
        assert_eq!(rx_s.try_recv().unwrap(), notice);
        assert_eq!(rx_r.try_recv().unwrap(), notice);

        let history = f.service.history(f.recruiter, f.app).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].deleted);
        assert!(history[0].text.is_none());
        let preview = history[1].reply_to.as_ref().unwrap();
        assert_eq!(preview.id, hello.id);
        assert!(preview.deleted);
        assert!(preview.text.is_none());
    }

    #[tokio::test]
    async fn test_leave_and_disconnect() {
        let f = setup().await;
        let (session, mut rx) = f.service.open_session();
        f.service.join(&session, Some(&token(f.student)), f.app).await;

        assert!(f.service.leave(&session, f.app).await);
        f.service
            .send(Some(&token(f.recruiter)), f.app, "anyone?", None)
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        f.service.join(&session, Some(&token(f.student)), f.app).await;
        f.service.disconnect(&session).await;
        assert_eq!(f.service.relay().member_count(f.app).await, 0);
    }

    #[tokio::test]
    async fn test_chat_enabled_applications() {
        let f = setup().await;
        let for_student = f.service.chat_enabled_applications(f.student).await.unwrap();
        assert_eq!(for_student.len(), 1);
        assert_eq!(for_student[0].counterpart.id, f.recruiter);
        assert!(f
            .service
            .chat_enabled_applications(f.outsider)
            .await
            .unwrap()
            .is_empty());
    }
}
