//! Error types for HireOn.

use thiserror::Error;

/// Common error type for HireOn.
#[derive(Error, Debug)]
pub enum HireonError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (missing, malformed or expired identity).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Write rejected by a uniqueness constraint.
    #[error("{0} already exists")]
    Conflict(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for HireonError {
    fn from(e: sqlx::Error) -> Self {
        HireonError::Database(e.to_string())
    }
}

impl HireonError {
    /// Convert a failed insert, reporting a unique-constraint violation as
    /// a conflict on `what`.
    pub fn from_insert(e: sqlx::Error, what: &str) -> Self {
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => HireonError::Conflict(what.to_string()),
            _ => HireonError::Database(e.to_string()),
        }
    }
}

/// Result type alias for HireOn operations.
pub type Result<T> = std::result::Result<T, HireonError>;
