//! Authentication module for HireOn.
//!
//! Password hashing, user registration and credential checks.

mod password;
mod registration;

pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use registration::{
    authenticate, register, register_with_role, RegistrationError, RegistrationRequest,
};
