//! Job and application models for HireOn.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::UserIdentity;

/// Review status of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Awaiting the recruiter's decision.
    #[default]
    Pending,
    /// Accepted; chat is open.
    Accepted,
    /// Rejected.
    Rejected,
}

impl ApplicationStatus {
    /// Convert status to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(format!("unknown application status: {s}")),
        }
    }
}

/// Job posting.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company_name: String,
    /// User ID of the recruiter who owns the posting.
    pub created_by: i64,
    pub created_at: String,
}

/// Data for creating a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub created_by: i64,
}

impl NewJob {
    /// Create a new job with a title and owner.
    pub fn new(title: impl Into<String>, created_by: i64) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            company_name: String::new(),
            created_by,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the company name.
    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = company_name.into();
        self
    }
}

/// A student's application to a job.
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub applicant_id: i64,
    pub status: ApplicationStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// An application together with the job it targets.
#[derive(Debug, Clone)]
pub struct AppliedJob {
    pub application: Application,
    pub job: Job,
}

/// A user's clear-for-me watermark on an application.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearMark {
    pub user_id: i64,
    pub cleared_at: DateTime<Utc>,
}

/// Which side of an application a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticipantRole {
    /// The student who applied.
    #[serde(rename = "student")]
    Applicant,
    /// The recruiter who owns the job.
    #[serde(rename = "recruiter")]
    JobCreator,
}

/// Everything the chat core needs to know about an application.
///
/// Loaded fresh for every admission decision, so a status change or a job
/// ownership transfer takes effect on the next operation.
#[derive(Debug, Clone)]
pub struct ApplicationContext {
    pub application_id: i64,
    pub status: ApplicationStatus,
    pub applicant_id: i64,
    pub job_id: i64,
    pub job_creator_id: i64,
    pub clear_marks: Vec<ClearMark>,
}

impl ApplicationContext {
    /// Role of `user_id` on this application, if they are a participant.
    pub fn participant_role(&self, user_id: i64) -> Option<ParticipantRole> {
        if user_id == self.applicant_id {
            Some(ParticipantRole::Applicant)
        } else if user_id == self.job_creator_id {
            Some(ParticipantRole::JobCreator)
        } else {
            None
        }
    }

    /// The other participant from `user_id`'s point of view.
    pub fn counterpart_of(&self, user_id: i64) -> Option<i64> {
        match self.participant_role(user_id)? {
            ParticipantRole::Applicant => Some(self.job_creator_id),
            ParticipantRole::JobCreator => Some(self.applicant_id),
        }
    }

    /// The clear-for-me watermark of `user_id`, if any.
    pub fn watermark_for(&self, user_id: i64) -> Option<DateTime<Utc>> {
        self.clear_marks
            .iter()
            .find(|mark| mark.user_id == user_id)
            .map(|mark| mark.cleared_at)
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ApplicationStatus::Accepted
    }
}

/// An accepted application listed in the caller's chat inbox.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEnabledApplication {
    pub application_id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
    /// The caller's side of the application.
    pub role: ParticipantRole,
    pub counterpart: UserIdentity,
    pub updated_at: String,
}
