//! Job and application handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::AppState;
use crate::application::{ApplicationRepository, JobRepository, NewJob};
use crate::db::{Role, UserRepository};
use crate::web::dto::{
    ApiResponse, ApplicantResponse, ApplicationContextResponse, ApplicationResponse,
    AppliedJobResponse, CreateJobRequest, JobResponse, UpdateStatusRequest, ValidatedJson,
};
use crate::HireonError;
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/jobs - Post a job. Recruiters only.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobResponse>>), ApiError> {
    if auth.identity().role != Role::Recruiter {
        return Err(ApiError::forbidden("Only recruiters can post jobs"));
    }

    let new_job = NewJob::new(req.title.trim(), auth.user_id())
        .with_description(req.description)
        .with_company(req.company_name.trim());
    let job = JobRepository::new(&state.pool).create(&new_job).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(job.into()))))
}

/// GET /api/jobs - All job postings, newest first.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<JobResponse>>>, ApiError> {
    let jobs = JobRepository::new(&state.pool).list().await?;
    Ok(Json(ApiResponse::new(
        jobs.into_iter().map(JobResponse::from).collect(),
    )))
}

/// GET /api/jobs/:id - One job posting.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let job = JobRepository::new(&state.pool)
        .get_by_id(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    Ok(Json(ApiResponse::new(job.into())))
}

/// GET /api/jobs/:id/applications - Applicants of a job.
///
/// Only the job's owner and the superadmin may list them.
pub async fn list_job_applications(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ApplicantResponse>>>, ApiError> {
    let job = JobRepository::new(&state.pool)
        .get_by_id(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    if job.created_by != auth.user_id() && !auth.identity().is_superadmin() {
        return Err(ApiError::forbidden(
            "Only the job's recruiter can list its applicants",
        ));
    }

    let applications = ApplicationRepository::new(&state.pool)
        .list_by_job(job_id)
        .await?;
    let applicant_ids: Vec<i64> = applications.iter().map(|a| a.applicant_id).collect();
    let identities = UserRepository::new(&state.pool)
        .identities(&applicant_ids)
        .await?;

    let applicants = applications
        .into_iter()
        .filter_map(|application| {
            let applicant = identities.get(&application.applicant_id)?.clone();
            Some(ApplicantResponse {
                application: application.into(),
                applicant,
            })
        })
        .collect();

    Ok(Json(ApiResponse::new(applicants)))
}

/// GET /api/applications - The caller's own applications with their jobs.
pub async fn list_my_applications(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<AppliedJobResponse>>>, ApiError> {
    let applied = ApplicationRepository::new(&state.pool)
        .list_by_applicant(auth.user_id())
        .await?;

    Ok(Json(ApiResponse::new(
        applied.into_iter().map(AppliedJobResponse::from).collect(),
    )))
}

/// POST /api/jobs/:id/apply - Apply to a job. Students only, once per job.
pub async fn apply(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<ApplicationResponse>>), ApiError> {
    if auth.identity().role != Role::Student {
        return Err(ApiError::forbidden("Only students can apply to jobs"));
    }

    JobRepository::new(&state.pool)
        .get_by_id(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    let application = ApplicationRepository::new(&state.pool)
        .create(job_id, auth.user_id())
        .await
        .map_err(|e| match e {
            HireonError::Conflict(_) => ApiError::conflict("Already applied to this job"),
            other => other.into(),
        })?;
    tracing::info!(
        application_id = application.id,
        job_id,
        applicant_id = auth.user_id(),
        "Application submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(application.into())),
    ))
}

/// GET /api/applications/:id - Status, participants and clear watermarks.
///
/// Visible to both participants and the superadmin.
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<ApiResponse<ApplicationContextResponse>>, ApiError> {
    let ctx = ApplicationRepository::new(&state.pool)
        .get_context(application_id)
        .await?
        .ok_or_else(|| ApiError::not_found("application not found"))?;

    if ctx.participant_role(auth.user_id()).is_none() && !auth.identity().is_superadmin() {
        return Err(ApiError::forbidden("Not a participant of this application"));
    }

    Ok(Json(ApiResponse::new(ctx.into())))
}

/// PATCH /api/applications/:id/status - Review an application.
///
/// Only the current owner of the job may change the status.
pub async fn update_application_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<ApplicationResponse>>, ApiError> {
    let applications = ApplicationRepository::new(&state.pool);
    let ctx = applications
        .get_context(application_id)
        .await?
        .ok_or_else(|| ApiError::not_found("application not found"))?;

    if ctx.job_creator_id != auth.user_id() {
        return Err(ApiError::forbidden(
            "Only the job's recruiter can review this application",
        ));
    }

    let application = applications
        .set_status(application_id, req.status)
        .await?
        .ok_or_else(|| ApiError::not_found("application not found"))?;

    tracing::info!(
        application_id,
        status = %application.status,
        reviewer_id = auth.user_id(),
        "Application status changed"
    );

    Ok(Json(ApiResponse::new(application.into())))
}
