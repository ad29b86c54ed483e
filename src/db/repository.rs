//! User repository for HireOn.
//!
//! This module provides CRUD operations for users in the database.

use std::collections::HashMap;

use super::user::{NewUser, Role, User, UserIdentity};
use super::DbPool;
use crate::datetime::now_timestamp;
use crate::{HireonError, Result};

/// Database row type for User.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    fullname: String,
    email: String,
    password: String,
    role: String,
    profile_photo: Option<String>,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            password: row.password,
            role: row.role.parse().unwrap_or(Role::Student),
            profile_photo: row.profile_photo,
            created_at: row.created_at,
        }
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (fullname, email, password, role, profile_photo, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&new_user.fullname)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.role.as_str())
        .bind(&new_user.profile_photo)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await
        .map_err(|e| HireonError::from_insert(e, "user"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| HireonError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, fullname, email, password, role, profile_photo, created_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, fullname, email, password, role, profile_photo, created_at
            FROM users WHERE email = $1 COLLATE NOCASE
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Check if an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 COLLATE NOCASE)")
                .bind(email)
                .fetch_one(self.pool)
                .await
                .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(exists.0)
    }

    /// Resolve public identities for a set of user IDs.
    ///
    /// Unknown IDs are absent from the returned map.
    pub async fn identities(&self, ids: &[i64]) -> Result<HashMap<i64, UserIdentity>> {
        let mut identities = HashMap::with_capacity(ids.len());
        for &id in ids {
            if identities.contains_key(&id) {
                continue;
            }
            if let Some(user) = self.get_by_id(id).await? {
                identities.insert(id, user.identity());
            }
        }
        Ok(identities)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| HireonError::Database(e.to_string()))?;

        Ok(count.0)
    }
}
