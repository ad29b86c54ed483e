//! Chat message storage for HireOn.
//!
//! Messages belong to an application. Deleting a message for everyone
//! leaves a tombstone row so replies to it can still render a placeholder.

use chrono::{DateTime, Utc};

use crate::datetime::{now_timestamp, parse_timestamp};
use crate::db::DbPool;
use crate::{HireonError, Result};

/// A stored chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub application_id: i64,
    pub job_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    /// Message text. Kept on tombstones but never shown.
    pub body: String,
    pub reply_to_id: Option<i64>,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database row type for Message.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    application_id: i64,
    job_id: i64,
    sender_id: i64,
    receiver_id: i64,
    body: String,
    reply_to_id: Option<i64>,
    is_deleted: bool,
    deleted_at: Option<String>,
    created_at: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = HireonError;

    fn try_from(row: MessageRow) -> Result<Self> {
        let created_at = parse_timestamp(&row.created_at).ok_or_else(|| {
            HireonError::Database(format!("invalid created_at: {}", row.created_at))
        })?;

        Ok(Self {
            id: row.id,
            application_id: row.application_id,
            job_id: row.job_id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            body: row.body,
            reply_to_id: row.reply_to_id,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at,
        })
    }
}

/// New message for insertion.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub application_id: i64,
    pub job_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub body: String,
    pub reply_to_id: Option<i64>,
}

impl NewMessage {
    pub fn new(
        application_id: i64,
        job_id: i64,
        sender_id: i64,
        receiver_id: i64,
        body: impl Into<String>,
    ) -> Self {
        Self {
            application_id,
            job_id,
            sender_id,
            receiver_id,
            body: body.into(),
            reply_to_id: None,
        }
    }

    /// Mark this message as a reply.
    pub fn reply_to(mut self, message_id: Option<i64>) -> Self {
        self.reply_to_id = message_id;
        self
    }
}

const SELECT_COLUMNS: &str = "SELECT id, application_id, job_id, sender_id, receiver_id, body, \
     reply_to_id, is_deleted, deleted_at, created_at FROM messages";

/// Repository for chat messages.
pub struct MessageRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new MessageRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Persist a message stamped with the current time.
    pub async fn create(&self, message: &NewMessage) -> Result<Message> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO messages (application_id, job_id, sender_id, receiver_id, body, reply_to_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(message.application_id)
        .bind(message.job_id)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.body)
        .bind(message.reply_to_id)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| HireonError::NotFound("message".to_string()))
    }

    /// Get a message by ID, tombstones included.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| HireonError::Database(e.to_string()))?;

        row.map(Message::try_from).transpose()
    }

    /// All messages of an application, oldest first.
    ///
    /// Ties on the timestamp fall back to insertion order.
    pub async fn list_by_application(&self, application_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "{SELECT_COLUMNS} WHERE application_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(application_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        rows.into_iter().map(Message::try_from).collect()
    }

    /// Tombstone a message.
    ///
    /// Returns false if the message does not exist or is already deleted.
    pub async fn mark_deleted(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE messages SET is_deleted = 1, deleted_at = $1 WHERE id = $2 AND is_deleted = 0",
        )
        .bind(now_timestamp())
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete every message of an application.
    pub async fn delete_by_application(&self, application_id: i64) -> Result<usize> {
        let result = sqlx::query("DELETE FROM messages WHERE application_id = $1")
            .bind(application_id)
            .execute(self.pool)
            .await
            .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(result.rows_affected() as usize)
    }

    /// Count messages of an application, tombstones included.
    pub async fn count_by_application(&self, application_id: i64) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE application_id = $1")
                .bind(application_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ApplicationRepository, JobRepository, NewJob};
    use crate::db::{Database, NewUser, Role, UserRepository};

    struct Fixture {
        db: Database,
        student: i64,
        recruiter: i64,
        job: i64,
        app: i64,
    }

    async fn setup() -> Fixture {
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
        let job = JobRepository::new(db.pool())
            .create(&NewJob::new("Backend Engineer", recruiter))
            .await
            .unwrap()
            .id;
        let app = ApplicationRepository::new(db.pool())
            .create(job, student)
            .await
            .unwrap()
            .id;
        Fixture {
            db,
            student,
            recruiter,
            job,
            app,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let f = setup().await;
        let repo = MessageRepository::new(f.db.pool());

        let msg = repo
            .create(&NewMessage::new(f.app, f.job, f.student, f.recruiter, "Hello"))
            .await
            .unwrap();

        assert_eq!(msg.body, "Hello");
        assert_eq!(msg.sender_id, f.student);
        assert_eq!(msg.receiver_id, f.recruiter);
        assert!(!msg.is_deleted);
        assert!(msg.reply_to_id.is_none());

        let fetched = repo.get_by_id(msg.id).await.unwrap().unwrap();
        assert_eq!(fetched, msg);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_chronological() {
        let f = setup().await;
        let repo = MessageRepository::new(f.db.pool());

        let first = repo
            .create(&NewMessage::new(f.app, f.job, f.student, f.recruiter, "one"))
            .await
            .unwrap();
        let second = repo
            .create(
                &NewMessage::new(f.app, f.job, f.recruiter, f.student, "two")
                    .reply_to(Some(first.id)),
            )
            .await
            .unwrap();

        let list = repo.list_by_application(f.app).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, first.id);
        assert_eq!(list[1].id, second.id);
        assert_eq!(list[1].reply_to_id, Some(first.id));
    }

    #[tokio::test]
    async fn test_mark_deleted_keeps_row() {
        let f = setup().await;
        let repo = MessageRepository::new(f.db.pool());
        let msg = repo
            .create(&NewMessage::new(f.app, f.job, f.student, f.recruiter, "oops"))
            .await
            .unwrap();

        assert!(repo.mark_deleted(msg.id).await.unwrap());
        assert!(!repo.mark_deleted(msg.id).await.unwrap());
        assert!(!repo.mark_deleted(9999).await.unwrap());

        let tombstone = repo.get_by_id(msg.id).await.unwrap().unwrap();
        assert!(tombstone.is_deleted);
        assert!(tombstone.deleted_at.is_some());
        assert_eq!(repo.count_by_application(f.app).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_application() {
        let f = setup().await;
        let repo = MessageRepository::new(f.db.pool());
        let first = repo
            .create(&NewMessage::new(f.app, f.job, f.student, f.recruiter, "one"))
            .await
            .unwrap();
        repo.create(
            &NewMessage::new(f.app, f.job, f.recruiter, f.student, "two").reply_to(Some(first.id)),
        )
        .await
        .unwrap();

        assert_eq!(repo.delete_by_application(f.app).await.unwrap(), 2);
        assert!(repo.list_by_application(f.app).await.unwrap().is_empty());
        assert_eq!(repo.delete_by_application(f.app).await.unwrap(), 0);
    }
}
