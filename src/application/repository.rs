//! Application repository for HireOn.
//!
//! Applications, their review status, and per-user chat clear watermarks.

use chrono::{DateTime, Utc};

use super::types::{
    Application, ApplicationContext, ApplicationStatus, AppliedJob, ChatEnabledApplication,
    ClearMark, Job, ParticipantRole,
};
use crate::datetime::{format_timestamp, now_timestamp, parse_timestamp};
use crate::db::{DbPool, UserRepository};
use crate::{HireonError, Result};

/// Database row type for Application.
#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    job_id: i64,
    applicant_id: i64,
    status: String,
    created_at: String,
    updated_at: String,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            job_id: row.job_id,
            applicant_id: row.applicant_id,
            status: row.status.parse().unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AppliedJobRow {
    id: i64,
    job_id: i64,
    applicant_id: i64,
    status: String,
    created_at: String,
    updated_at: String,
    title: String,
    description: String,
    company_name: String,
    created_by: i64,
    job_created_at: String,
}

impl From<AppliedJobRow> for AppliedJob {
    fn from(row: AppliedJobRow) -> Self {
        Self {
            job: Job {
                id: row.job_id,
                title: row.title,
                description: row.description,
                company_name: row.company_name,
                created_by: row.created_by,
                created_at: row.job_created_at,
            },
            application: Application {
                id: row.id,
                job_id: row.job_id,
                applicant_id: row.applicant_id,
                status: row.status.parse().unwrap_or_default(),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContextRow {
    id: i64,
    job_id: i64,
    applicant_id: i64,
    status: String,
    job_creator_id: i64,
}

#[derive(sqlx::FromRow)]
struct ClearMarkRow {
    user_id: i64,
    cleared_at: String,
}

#[derive(sqlx::FromRow)]
struct ChatEnabledRow {
    application_id: i64,
    job_id: i64,
    job_title: String,
    company_name: String,
    counterpart_id: i64,
    updated_at: String,
}

/// Repository for application operations.
pub struct ApplicationRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ApplicationRepository<'a> {
    /// Create a new ApplicationRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a pending application.
    pub async fn create(&self, job_id: i64, applicant_id: i64) -> Result<Application> {
        let now = now_timestamp();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO applications (job_id, applicant_id, status, created_at, updated_at)
            VALUES ($1, $2, 'pending', $3, $4)
            RETURNING id
            "#,
        )
        .bind(job_id)
        .bind(applicant_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| HireonError::from_insert(e, "application"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| HireonError::NotFound("application".to_string()))
    }

    /// Get an application by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, job_id, applicant_id, status, created_at, updated_at
            FROM applications WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(row.map(Application::from))
    }

    /// Applications to a job, oldest first.
    pub async fn list_by_job(&self, job_id: i64) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, job_id, applicant_id, status, created_at, updated_at
            FROM applications
            WHERE job_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Application::from).collect())
    }

    /// A student's applications with their jobs, newest first.
    pub async fn list_by_applicant(&self, applicant_id: i64) -> Result<Vec<AppliedJob>> {
        let rows = sqlx::query_as::<_, AppliedJobRow>(
            r#"
            SELECT a.id, a.job_id, a.applicant_id, a.status, a.created_at, a.updated_at,
                   j.title, j.description, j.company_name, j.created_by,
                   j.created_at AS job_created_at
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(AppliedJob::from).collect())
    }

    /// Set the review status.
    ///
    /// Returns the updated application, or None if not found.
    pub async fn set_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<Application>> {
        let result =
            sqlx::query("UPDATE applications SET status = $1, updated_at = $2 WHERE id = $3")
                .bind(status.as_str())
                .bind(now_timestamp())
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| HireonError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Load the chat view of an application: status, both participants and
    /// clear watermarks.
    ///
    /// The job creator is read from the job at call time.
    pub async fn get_context(&self, id: i64) -> Result<Option<ApplicationContext>> {
        let row = sqlx::query_as::<_, ContextRow>(
            r#"
            SELECT a.id, a.job_id, a.applicant_id, a.status, j.created_by AS job_creator_id
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let clear_marks = self.list_clear_marks(row.id).await?;

        Ok(Some(ApplicationContext {
            application_id: row.id,
            status: row.status.parse().unwrap_or_default(),
            applicant_id: row.applicant_id,
            job_id: row.job_id,
            job_creator_id: row.job_creator_id,
            clear_marks,
        }))
    }

    /// List all clear watermarks on an application.
    pub async fn list_clear_marks(&self, application_id: i64) -> Result<Vec<ClearMark>> {
        let rows = sqlx::query_as::<_, ClearMarkRow>(
            r#"
            SELECT user_id, cleared_at
            FROM chat_clear_marks
            WHERE application_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(application_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let cleared_at = parse_timestamp(&row.cleared_at).ok_or_else(|| {
                    HireonError::Database(format!("invalid cleared_at: {}", row.cleared_at))
                })?;
                Ok(ClearMark {
                    user_id: row.user_id,
                    cleared_at,
                })
            })
            .collect()
    }

    /// Set a user's clear watermark, replacing any earlier one.
    pub async fn upsert_clear_mark(
        &self,
        application_id: i64,
        user_id: i64,
        cleared_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_clear_marks (application_id, user_id, cleared_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(application_id, user_id) DO UPDATE SET cleared_at = excluded.cleared_at
            "#,
        )
        .bind(application_id)
        .bind(user_id)
        .bind(format_timestamp(&cleared_at))
        .execute(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(())
    }

    /// List accepted applications on which `user_id` can chat.
    ///
    /// Covers both sides: applications the user submitted and applications
    /// to jobs the user owns. Most recently updated first.
    pub async fn list_chat_enabled(&self, user_id: i64) -> Result<Vec<ChatEnabledApplication>> {
        let as_applicant = sqlx::query_as::<_, ChatEnabledRow>(
            r#"
            SELECT a.id AS application_id, a.job_id, j.title AS job_title, j.company_name,
                   j.created_by AS counterpart_id, a.updated_at
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1 AND a.status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        let as_recruiter = sqlx::query_as::<_, ChatEnabledRow>(
            r#"
            SELECT a.id AS application_id, a.job_id, j.title AS job_title, j.company_name,
                   a.applicant_id AS counterpart_id, a.updated_at
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.created_by = $1 AND a.status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        let counterpart_ids: Vec<i64> = as_applicant
            .iter()
            .chain(as_recruiter.iter())
            .map(|row| row.counterpart_id)
            .collect();
        let identities = UserRepository::new(self.pool)
            .identities(&counterpart_ids)
            .await?;

        let tagged = as_applicant
            .into_iter()
            .map(|row| (ParticipantRole::Applicant, row))
            .chain(
                as_recruiter
                    .into_iter()
                    .map(|row| (ParticipantRole::JobCreator, row)),
            );

        let mut entries: Vec<ChatEnabledApplication> = tagged
            .filter_map(|(role, row)| {
                let counterpart = identities.get(&row.counterpart_id)?.clone();
                Some(ChatEnabledApplication {
                    application_id: row.application_id,
                    job_id: row.job_id,
                    job_title: row.job_title,
                    company_name: row.company_name,
                    role,
                    counterpart,
                    updated_at: row.updated_at,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.application_id.cmp(&a.application_id))
        });
        Ok(entries)
    }
}
