//! User role management.
//!
//! Accounts are created through the storefront's passcode flow; this command
//! only changes the role of an account that already exists.

use elegance_core::{Email, UserRole};
use elegance_storefront::db::{RepositoryError, UserRepository};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during role changes.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No user with email: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Set the role of the account registered under `email`.
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` for a malformed address and
/// `UserError::NotFound` if no account uses it.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;

    match UserRepository::new(&pool).set_role(&email, role).await {
        Ok(()) => {
            tracing::info!(%email, %role, "Role updated");
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(UserError::NotFound(email.to_string())),
        Err(e) => Err(UserError::Repository(e)),
    }
}
