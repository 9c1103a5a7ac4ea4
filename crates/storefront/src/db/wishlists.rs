//! Wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use elegance_core::UserId;
use elegance_core::wishlist::{Wishlist, WishlistItem};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    user_id: UserId,
    items: Json<Vec<WishlistItem>>,
    updated_at: DateTime<Utc>,
}

impl From<WishlistRow> for Wishlist {
    fn from(row: WishlistRow) -> Self {
        Self {
            user_id: row.user_id,
            items: row.items.0,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's wishlist, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Wishlist, RepositoryError> {
        let row = sqlx::query_as::<_, WishlistRow>(
            r"
            WITH inserted AS (
                INSERT INTO storefront.wishlist (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO NOTHING
                RETURNING user_id, items, updated_at
            )
            SELECT user_id, items, updated_at FROM inserted
            UNION ALL
            SELECT user_id, items, updated_at FROM storefront.wishlist WHERE user_id = $1
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply `change` to the user's wishlist while holding its row lock.
    ///
    /// The row is read with `FOR UPDATE`, so concurrent writers (checkout
    /// included) are serialized. Nothing is written if `change` fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no wishlist, the
    /// error returned by `change`, or a database error.
    pub async fn modify<F, E>(&self, user_id: UserId, change: F) -> Result<Wishlist, E>
    where
        F: FnOnce(&mut Wishlist) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let row = sqlx::query_as::<_, WishlistRow>(
            "SELECT user_id, items, updated_at FROM storefront.wishlist WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;
        let mut wishlist = Wishlist::from(row.ok_or(RepositoryError::NotFound)?);

        change(&mut wishlist)?;

        sqlx::query(
            "UPDATE storefront.wishlist SET items = $2, updated_at = $3 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(Json(&wishlist.items))
        .bind(wishlist.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(wishlist)
    }
}
