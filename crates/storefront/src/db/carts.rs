//! Cart repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use elegance_core::UserId;
use elegance_core::cart::{Cart, CartLine};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartRow {
    user_id: UserId,
    items: Json<Vec<CartLine>>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            user_id: row.user_id,
            items: row.items.0,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            WITH inserted AS (
                INSERT INTO storefront.cart (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO NOTHING
                RETURNING user_id, items, updated_at
            )
            SELECT user_id, items, updated_at FROM inserted
            UNION ALL
            SELECT user_id, items, updated_at FROM storefront.cart WHERE user_id = $1
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply `change` to the user's cart while holding its row lock.
    ///
    /// The row is read with `FOR UPDATE`, so concurrent writers (checkout
    /// included) are serialized. Nothing is written if `change` fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart, the
    /// error returned by `change`, or a database error.
    pub async fn modify<F, E>(&self, user_id: UserId, change: F) -> Result<Cart, E>
    where
        F: FnOnce(&mut Cart) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let row = sqlx::query_as::<_, CartRow>(
            "SELECT user_id, items, updated_at FROM storefront.cart WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;
        let mut cart = Cart::from(row.ok_or(RepositoryError::NotFound)?);

        change(&mut cart)?;

        sqlx::query(
            "UPDATE storefront.cart SET items = $2, updated_at = $3 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(Json(&cart.items))
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(cart)
    }
}
