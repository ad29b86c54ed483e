//! Channel admission for application chat.
//!
//! A party may use an application's channel when their identity resolves,
//! the application exists and is accepted, and they are its applicant or
//! the current owner of its job.

use thiserror::Error;

use crate::application::{ApplicationContext, ApplicationRepository, ParticipantRole};
use crate::db::{DbPool, Role};
use crate::HireonError;

/// Verified caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn is_superadmin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// Resolves bearer tokens to identities.
///
/// Any failure (missing, malformed, expired, bad signature) is `None`.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Identity>;
}

/// Reasons a party is refused a channel.
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("application not found")]
    ApplicationNotFound,

    #[error("application is not accepted")]
    NotAccepted,

    #[error("not a participant of this application")]
    NotParticipant,

    #[error("database error: {0}")]
    Database(String),
}

impl From<HireonError> for AdmissionError {
    fn from(e: HireonError) -> Self {
        AdmissionError::Database(e.to_string())
    }
}

impl From<AdmissionError> for HireonError {
    fn from(e: AdmissionError) -> Self {
        match e {
            AdmissionError::Unauthenticated => HireonError::Auth(e.to_string()),
            AdmissionError::ApplicationNotFound => HireonError::NotFound("application".to_string()),
            AdmissionError::NotAccepted | AdmissionError::NotParticipant => {
                HireonError::Permission(e.to_string())
            }
            AdmissionError::Database(msg) => HireonError::Database(msg),
        }
    }
}

/// A successful admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub user_id: i64,
    pub application_id: i64,
    pub job_id: i64,
    pub role: ParticipantRole,
    /// The other participant, resolved at decision time.
    pub counterpart_id: i64,
}

/// Apply the admission predicate to a loaded application.
pub fn check(ctx: &ApplicationContext, user_id: i64) -> Result<Admission, AdmissionError> {
    if !ctx.is_accepted() {
        return Err(AdmissionError::NotAccepted);
    }
    let role = ctx
        .participant_role(user_id)
        .ok_or(AdmissionError::NotParticipant)?;
    let counterpart_id = ctx
        .counterpart_of(user_id)
        .ok_or(AdmissionError::NotParticipant)?;

    Ok(Admission {
        user_id,
        application_id: ctx.application_id,
        job_id: ctx.job_id,
        role,
        counterpart_id,
    })
}

/// Load an application and decide admission for `user_id`.
///
/// Never cached; every call reads the application's current state.
pub async fn admit(
    pool: &DbPool,
    user_id: i64,
    application_id: i64,
) -> Result<(Admission, ApplicationContext), AdmissionError> {
    let ctx = ApplicationRepository::new(pool)
        .get_context(application_id)
        .await?
        .ok_or(AdmissionError::ApplicationNotFound)?;
    let admission = check(&ctx, user_id)?;
    Ok((admission, ctx))
}

/// Resolve a token and decide admission.
pub async fn admit_token(
    pool: &DbPool,
    verifier: &dyn IdentityVerifier,
    token: Option<&str>,
    application_id: i64,
) -> Result<(Admission, ApplicationContext), AdmissionError> {
    let identity = token
        .filter(|t| !t.is_empty())
        .and_then(|t| verifier.verify(t))
        .ok_or(AdmissionError::Unauthenticated)?;
    admit(pool, identity.user_id, application_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationStatus;

    fn context(status: ApplicationStatus) -> ApplicationContext {
        ApplicationContext {
            application_id: 1,
            status,
            applicant_id: 10,
            job_id: 5,
            job_creator_id: 20,
            clear_marks: vec![],
        }
    }

    struct StaticVerifier;

    impl IdentityVerifier for StaticVerifier {
        fn verify(&self, token: &str) -> Option<Identity> {
            token.strip_prefix("user-")?.parse().ok().map(|user_id| Identity {
                user_id,
                role: Role::Student,
            })
        }
    }

    #[test]
    fn test_check_admits_both_participants() {
        let ctx = context(ApplicationStatus::Accepted);

        let applicant = check(&ctx, 10).unwrap();
        assert_eq!(applicant.role, ParticipantRole::Applicant);
        assert_eq!(applicant.counterpart_id, 20);

        let recruiter = check(&ctx, 20).unwrap();
        assert_eq!(recruiter.role, ParticipantRole::JobCreator);
        assert_eq!(recruiter.counterpart_id, 10);
    }

    #[test]
    fn test_check_rejects_non_accepted() {
        for status in [ApplicationStatus::Pending, ApplicationStatus::Rejected] {
            let ctx = context(status);
            assert!(matches!(check(&ctx, 10), Err(AdmissionError::NotAccepted)));
            assert!(matches!(check(&ctx, 20), Err(AdmissionError::NotAccepted)));
        }
    }

    #[test]
    fn test_check_rejects_outsider() {
        let ctx = context(ApplicationStatus::Accepted);
        assert!(matches!(check(&ctx, 30), Err(AdmissionError::NotParticipant)));
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            HireonError::from(AdmissionError::Unauthenticated),
            HireonError::Auth(_)
        ));
        assert!(matches!(
            HireonError::from(AdmissionError::ApplicationNotFound),
            HireonError::NotFound(_)
        ));
        assert!(matches!(
            HireonError::from(AdmissionError::NotAccepted),
            HireonError::Permission(_)
        ));
        assert!(matches!(
            HireonError::from(AdmissionError::NotParticipant),
            HireonError::Permission(_)
        ));
    }

    #[tokio::test]
    async fn test_admit_token_unauthenticated() {
        let db = crate::db::Database::open_in_memory().await.unwrap();
        let verifier = StaticVerifier;

        for token in [None, Some(""), Some("garbage")] {
            let result = admit_token(db.pool(), &verifier, token, 1).await;
            assert!(matches!(result, Err(AdmissionError::Unauthenticated)));
        }
    }

    #[tokio::test]
    async fn test_admit_missing_application() {
        let db = crate::db::Database::open_in_memory().await.unwrap();
        let result = admit_token(db.pool(), &StaticVerifier, Some("user-1"), 42).await;
        assert!(matches!(result, Err(AdmissionError::ApplicationNotFound)));
    }
}
