//! User registration and login for HireOn.

use thiserror::Error;
use tracing::info;

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{NewUser, Role, User, UserRepository};
use crate::HireonError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Email already registered.
    #[error("email already registered")]
    EmailExists,

    /// Role cannot be chosen at sign-up.
    #[error("role {0} cannot be self-assigned")]
    RoleNotAllowed(Role),

    /// Password rejected.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<HireonError> for RegistrationError {
    fn from(e: HireonError) -> Self {
        RegistrationError::Database(e.to_string())
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegistrationRequest {
    /// Create a new registration request for a student.
    pub fn new(
        fullname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            fullname: fullname.into(),
            email: email.into(),
            password: password.into(),
            role: Role::Student,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Register a new student or recruiter.
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    if request.role == Role::SuperAdmin {
        return Err(RegistrationError::RoleNotAllowed(request.role));
    }
    register_with_role(repo, request).await
}

/// Register a user with any role, including superadmin.
///
/// Not reachable from the public API.
pub async fn register_with_role(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    if repo.email_exists(&request.email).await? {
        return Err(RegistrationError::EmailExists);
    }

    let password_hash = hash_password(&request.password)?;
    let new_user =
        NewUser::new(&request.fullname, &request.email, password_hash).with_role(request.role);
    // A concurrent sign-up with the same email can pass the check above.
    let user = repo.create(&new_user).await.map_err(|e| match e {
        HireonError::Conflict(_) => RegistrationError::EmailExists,
        other => other.into(),
    })?;

    info!(
        email = %user.email,
        user_id = user.id,
        role = %user.role,
        "New user registered"
    );

    Ok(user)
}

/// Check credentials and return the user.
///
/// Unknown email and wrong password yield the same error.
pub async fn authenticate(
    repo: &UserRepository<'_>,
    email: &str,
    password: &str,
) -> crate::Result<User> {
    let user = repo
        .get_by_email(email)
        .await?
        .ok_or_else(|| HireonError::Auth("Invalid email or password".to_string()))?;

    verify_password(password, &user.password)
        .map_err(|_| HireonError::Auth("Invalid email or password".to_string()))?;

    Ok(user)
}
