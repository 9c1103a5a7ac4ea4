//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] elegance_core::EmailError),

    /// Wrong password, unknown account or account without a password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Passcode is wrong, expired or already used.
    #[error("Invalid or expired code")]
    InvalidOtp,

    /// Signup completion attempted before the email was verified.
    #[error("Verify your email before completing signup")]
    EmailNotVerified,

    /// An account with a password already exists for this email.
    #[error("An account with this email already exists")]
    AccountExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Passcode email could not be delivered.
    #[error("failed to deliver passcode: {0}")]
    Delivery(#[from] EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
