//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use elegance_core::{Email, UserId, UserRole};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Role at login time. `RequireAdmin` re-reads the stored role.
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// An email this session proved ownership of with a passcode.
///
/// Signup completion only accepts the email recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedEmail {
    pub email: Email,
    pub verified_at: DateTime<Utc>,
}

impl VerifiedEmail {
    #[must_use]
    pub const fn new(email: Email, verified_at: DateTime<Utc>) -> Self {
        Self { email, verified_at }
    }

    /// Whether this proof is for `email` and no older than `max_age` at `now`.
    #[must_use]
    pub fn covers(&self, email: &Email, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.email == *email && now - self.verified_at <= max_age
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the email verified by a passcode, pending signup completion.
    pub const VERIFIED_EMAIL: &str = "verified_email";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_email_covers_only_its_own_address() {
        let now = Utc::now();
        let proof = VerifiedEmail::new(Email::parse("buyer@example.com").unwrap(), now);
        let max_age = Duration::minutes(15);

        assert!(proof.covers(&Email::parse("Buyer@Example.com").unwrap(), now, max_age));
        assert!(!proof.covers(&Email::parse("other@example.com").unwrap(), now, max_age));
    }

    #[test]
    fn test_verified_email_expires() {
        let verified_at = Utc::now();
        let proof = VerifiedEmail::new(Email::parse("buyer@example.com").unwrap(), verified_at);
        let max_age = Duration::minutes(15);

        let email = proof.email.clone();
        assert!(proof.covers(&email, verified_at + Duration::minutes(15), max_age));
        assert!(!proof.covers(&email, verified_at + Duration::minutes(16), max_age));
    }
}
