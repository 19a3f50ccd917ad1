//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// The display strings of the client-facing variants are the messages the
/// API returns.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login without an identifier or password.
    #[error("Missing credentials")]
    MissingCredentials,

    /// Signup without a username or password.
    #[error("username and password are required")]
    MissingSignupFields,

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("username already exists")]
    UsernameTaken,

    #[error("email already exists")]
    EmailTaken,

    /// Invalid email format.
    #[error("Enter a valid email address.")]
    InvalidEmail(#[from] cwish_core::EmailError),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
