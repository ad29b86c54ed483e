//! Job repository for HireOn.

use tracing::info;

use super::types::{Job, NewJob};
use crate::datetime::now_timestamp;
use crate::db::DbPool;
use crate::{HireonError, Result};

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    title: String,
    description: String,
    company_name: String,
    created_by: i64,
    created_at: String,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            company_name: row.company_name,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Repository for job postings.
pub struct JobRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> JobRepository<'a> {
    /// Create a new JobRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a job posting.
    pub async fn create(&self, new_job: &NewJob) -> Result<Job> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (title, description, company_name, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&new_job.title)
        .bind(&new_job.description)
        .bind(&new_job.company_name)
        .bind(new_job.created_by)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| HireonError::NotFound("job".to_string()))
    }

    /// Get a job by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, title, description, company_name, created_by, created_at
            FROM jobs WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(row.map(Job::from))
    }

    /// All job postings, newest first.
    pub async fn list(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, title, description, company_name, created_by, created_at
            FROM jobs
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Job::from).collect())
    }

    /// Reassign a job to another owner.
    ///
    /// Chat on the job's applications follows the new owner immediately.
    /// Returns false if the job does not exist.
    pub async fn transfer(&self, job_id: i64, new_owner_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE jobs SET created_by = $1 WHERE id = $2")
            .bind(new_owner_id)
            .bind(job_id)
            .execute(self.pool)
            .await
            .map_err(|e| HireonError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            info!(job_id, new_owner_id, "Job ownership transferred");
        }
        Ok(result.rows_affected() > 0)
    }
}
