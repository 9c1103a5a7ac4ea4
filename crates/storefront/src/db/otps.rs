//! One-time passcode repository.
//!
//! At most one passcode is pending per email; issuing a new one replaces it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use elegance_core::{Email, OtpPurpose};

use super::RepositoryError;

/// Repository for passcode database operations.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    /// Create a new passcode repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store `code` for `email`, replacing any pending passcode.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        email: &Email,
        code: &str,
        purpose: OtpPurpose,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.otp (email, code, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET code = EXCLUDED.code,
                purpose = EXCLUDED.purpose,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            ",
        )
        .bind(email)
        .bind(code)
        .bind(purpose)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the passcode for `email` if it matches `code`, was issued for
    /// `purpose` and has not expired.
    ///
    /// A passcode can be consumed once. A code issued for another purpose is
    /// left in place.
    ///
    /// # Returns
    ///
    /// Returns `true` if a passcode was consumed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(
        &self,
        email: &Email,
        code: &str,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.otp
            WHERE email = $1 AND code = $2 AND purpose = $3 AND expires_at > $4
            ",
        )
        .bind(email)
        .bind(code)
        .bind(purpose)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove expired passcodes. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.otp WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
