//! API handlers.

pub mod auth;
pub mod chat;
pub mod job;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::chat::ChatService;
use crate::db::{DbPool, User};
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;

pub use auth::*;
pub use chat::*;
pub use job::*;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Name of the cookie that carries the access token.
    pub cookie_name: String,
    pub chat: ChatService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        pool: DbPool,
        jwt_secret: &str,
        access_token_expiry: u64,
        cookie_name: impl Into<String>,
        chat: ChatService,
    ) -> Self {
        Self {
            pool,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry,
            cookie_name: cookie_name.into(),
            chat,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
