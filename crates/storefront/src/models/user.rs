//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use elegance_core::address::AddressBook;
use elegance_core::{Email, UserId, UserRole};

/// A store account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Set once the user has proven control of the email with a passcode.
    pub email_verified: bool,
    pub role: UserRole,
    /// Whether a password has been set (signup completed).
    pub has_password: bool,
    pub addresses: AddressBook,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, as returned by the profile endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub role: UserRole,
    pub addresses: AddressBook,
    pub created_at: DateTime<Utc>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            email_verified: user.email_verified,
            role: user.role,
            addresses: user.addresses,
            created_at: user.created_at,
        }
    }
}
