//! User repository for database operations.
//!
//! Saved addresses are stored on the user row as a `JSONB` array.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use elegance_core::address::AddressBook;
use elegance_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::User;

const USER_COLUMNS: &str = r"
    id, email, name, phone, email_verified, role,
    password_hash IS NOT NULL AS has_password,
    addresses, created_at, updated_at
";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    name: Option<String>,
    phone: Option<String>,
    email_verified: bool,
    role: UserRole,
    has_password: bool,
    addresses: Json<AddressBook>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            email_verified: row.email_verified,
            role: row.role,
            has_password: row.has_password,
            addresses: row.addresses.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.user WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.user WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Get a user together with their password hash.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql =
            format!("SELECT {USER_COLUMNS}, password_hash FROM storefront.user WHERE email = $1");
        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.and_then(|r| r.password_hash.map(|hash| (r.user.into(), hash))))
    }

    /// Record that `email` passed passcode verification, creating the
    /// account on first sight.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_verified(&self, email: &Email) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.user (email, email_verified)
             VALUES ($1, TRUE)
             ON CONFLICT (email) DO UPDATE
             SET email_verified = TRUE, updated_at = NOW()
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Set the password (and optionally the name) of a verified account that
    /// has no password yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account already has a password.
    /// Returns `RepositoryError::NotFound` if no verified account exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_initial_password(
        &self,
        email: &Email,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.user
             SET password_hash = $2, name = COALESCE($3, name), updated_at = NOW()
             WHERE email = $1 AND email_verified AND password_hash IS NULL
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        match self.get_by_email(email).await? {
            Some(user) if user.has_password => {
                Err(RepositoryError::Conflict("account already exists".to_owned()))
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    /// Update name and phone. `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.user
             SET name = COALESCE($2, name), phone = COALESCE($3, phone), updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(phone)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Replace the user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save_addresses(
        &self,
        id: UserId,
        addresses: &AddressBook,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.user SET addresses = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(addresses))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.user SET role = $2, updated_at = NOW() WHERE email = $1",
        )
        .bind(email)
        .bind(role)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
