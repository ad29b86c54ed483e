//! HireOn - job board backend
//!
//! Students apply to jobs posted by recruiters. Once an application is
//! accepted, the applicant and the job's recruiter get a private chat with
//! replies, delete-for-everyone, clear-for-me and real-time delivery.

pub mod application;
pub mod auth;
pub mod chat;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, validate_password, verify_password, PasswordError,
    RegistrationError, RegistrationRequest,
};
pub use chat::{ChatService, MessageRelay};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository};
pub use error::{HireonError, Result};
