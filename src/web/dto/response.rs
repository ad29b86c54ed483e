//! Response DTOs for the web API.

use serde::Serialize;

use crate::application::{Application, ApplicationContext, AppliedJob, Job};
use crate::datetime::format_timestamp;
use crate::chat::DeleteOutcome;
use crate::db::{Role, User, UserIdentity};

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_photo: user.profile_photo.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT), also set as a cookie.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserInfo,
}

/// Job response.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub created_by: i64,
    pub created_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            company_name: job.company_name,
            created_by: job.created_by,
            created_at: job.created_at,
        }
    }
}

/// Application response.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: i64,
    pub job_id: i64,
    pub applicant_id: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            job_id: app.job_id,
            applicant_id: app.applicant_id,
            status: app.status.to_string(),
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

/// An application as its job's recruiter sees it.
#[derive(Debug, Serialize)]
pub struct ApplicantResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub applicant: UserIdentity,
}

/// An application as the student who sent it sees it.
#[derive(Debug, Serialize)]
pub struct AppliedJobResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub job: JobResponse,
}

impl From<AppliedJob> for AppliedJobResponse {
    fn from(applied: AppliedJob) -> Self {
        Self {
            application: applied.application.into(),
            job: applied.job.into(),
        }
    }
}

/// A participant's clear-for-me watermark.
#[derive(Debug, Serialize)]
pub struct ClearWatermark {
    pub user_id: i64,
    pub cleared_at: String,
}

/// Chat-facing view of an application.
#[derive(Debug, Serialize)]
pub struct ApplicationContextResponse {
    pub id: i64,
    pub status: String,
    pub applicant_id: i64,
    pub job_id: i64,
    pub job_creator_id: i64,
    pub clear_watermarks: Vec<ClearWatermark>,
}

impl From<ApplicationContext> for ApplicationContextResponse {
    fn from(ctx: ApplicationContext) -> Self {
        Self {
            id: ctx.application_id,
            status: ctx.status.to_string(),
            applicant_id: ctx.applicant_id,
            job_id: ctx.job_id,
            job_creator_id: ctx.job_creator_id,
            clear_watermarks: ctx
                .clear_marks
                .iter()
                .map(|mark| ClearWatermark {
                    user_id: mark.user_id,
                    cleared_at: format_timestamp(&mark.cleared_at),
                })
                .collect(),
        }
    }
}

/// Clear-all result.
#[derive(Debug, Serialize)]
pub struct ClearAllResponse {
    pub application_id: i64,
    /// Number of messages removed.
    pub removed: usize,
}

/// Clear-for-me result.
#[derive(Debug, Serialize)]
pub struct ClearForMeResponse {
    pub application_id: i64,
    /// Messages at or before this instant are hidden from the caller.
    pub cleared_at: String,
}

/// Delete-for-everyone result.
#[derive(Debug, Serialize)]
pub struct DeleteMessageResponse {
    pub message_id: i64,
    pub application_id: i64,
    /// False when the message had already been deleted.
    pub deleted: bool,
}

impl DeleteMessageResponse {
    pub fn new(message_id: i64, outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted { application_id } => Self {
                message_id,
                application_id,
                deleted: true,
            },
            DeleteOutcome::AlreadyDeleted { application_id } => Self {
                message_id,
                application_id,
                deleted: false,
            },
        }
    }
}
