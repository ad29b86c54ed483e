//! User model for HireOn.
//!
//! This module defines the User struct and Role enum for user management.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Job seeker; applies to jobs.
    #[default]
    Student,
    /// Posts jobs and reviews applications.
    Recruiter,
    /// Platform administrator.
    SuperAdmin,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Recruiter => "recruiter",
            Role::SuperAdmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "recruiter" => Ok(Role::Recruiter),
            "superadmin" => Ok(Role::SuperAdmin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// User entity representing a registered user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Full display name.
    pub fullname: String,
    /// Login email (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// User role.
    pub role: Role,
    /// Profile photo URL (optional).
    pub profile_photo: Option<String>,
    /// Account creation timestamp.
    pub created_at: String,
}

impl User {
    /// Check if this user is the platform administrator.
    pub fn is_superadmin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Public identity of this user, safe to send to other users.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            role: self.role,
            profile_photo: self.profile_photo.clone(),
        }
    }
}

/// Resolved identity of a user as shown to chat participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    pub id: i64,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    pub profile_photo: Option<String>,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Full display name.
    pub fullname: String,
    /// Login email.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// User role (defaults to Student).
    pub role: Role,
    /// Profile photo URL.
    pub profile_photo: Option<String>,
}

impl NewUser {
    /// Create a new user with minimal required fields.
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
            profile_photo: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the profile photo URL.
    pub fn with_profile_photo(mut self, url: impl Into<String>) -> Self {
        self.profile_photo = Some(url.into());
        self
    }
}
