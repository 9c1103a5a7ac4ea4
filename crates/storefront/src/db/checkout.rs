//! Transactional checkout.
//!
//! The cart row and the stock rows of every product in it are locked for the
//! duration of the transaction. Stock is taken with conditional updates, so a
//! concurrent checkout can never drive a count below zero. Any failure drops
//! the transaction and rolls back every write.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::instrument;

use elegance_core::cart::{Cart, CartLine};
use elegance_core::catalog::Product;
use elegance_core::checkout::{CheckoutError, StockDecrement, plan_checkout};
use elegance_core::order::{Order, ShippingAddress};
use elegance_core::pricing::PricingPolicy;
use elegance_core::{ProductId, UserId};

use super::RepositoryError;
use super::orders;
use super::products::{PRODUCT_SELECT, ProductRow, rows_to_products};

/// Why a checkout did not produce an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The cart failed validation. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] CheckoutError),

    /// Storage failed. The transaction was rolled back.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository that turns a cart into an order.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for everything in the user's cart.
    ///
    /// On success the order is stored, stock is decremented and the cart is
    /// empty. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::Rejected` if the cart is empty or a line
    /// can't be fulfilled, and `PlaceOrderError::Repository` for storage
    /// failures.
    #[instrument(skip(self, shipping_address, pricing), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping_address: ShippingAddress,
        payment_method: String,
        pricing: &PricingPolicy,
    ) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let cart = lock_cart(&mut tx, user_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let mut ids: Vec<ProductId> = cart.items.iter().map(|line| line.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products = lock_products(&mut tx, &ids).await?;
        let plan = plan_checkout(&cart, &products, pricing)?;

        for decrement in &plan.decrements {
            take_stock(&mut tx, decrement, &cart.items).await?;
        }

        let order = plan.into_order(user_id, shipping_address, payment_method, Utc::now());
        orders::insert(&mut tx, &order).await?;

        sqlx::query(
            "UPDATE storefront.cart SET items = '[]'::jsonb, updated_at = $2 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.order_id,
            total = %order.total,
            lines = order.items.len(),
            "Order placed"
        );
        Ok(order)
    }
}

async fn lock_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    let row: Option<(Json<Vec<CartLine>>, DateTime<Utc>)> = sqlx::query_as(
        "SELECT items, updated_at FROM storefront.cart WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|(items, updated_at)| Cart {
        user_id,
        items: items.0,
        updated_at,
    }))
}

/// Lock the stock rows of `ids` (in a fixed order) and load the products.
async fn lock_products(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[ProductId],
) -> Result<HashMap<ProductId, Product>, RepositoryError> {
    let uuids: Vec<uuid::Uuid> = ids.iter().map(ProductId::as_uuid).collect();

    sqlx::query(
        r"
        SELECT 1 FROM storefront.product_stock
        WHERE product_id = ANY($1)
        ORDER BY product_id, size
        FOR UPDATE
        ",
    )
    .bind(&uuids)
    .execute(&mut **tx)
    .await?;

    let sql = format!("{PRODUCT_SELECT} WHERE p.id = ANY($1) GROUP BY p.id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(&uuids)
        .fetch_all(&mut **tx)
        .await?;

    Ok(rows_to_products(rows)?
        .into_iter()
        .map(|p| (p.product_id, p))
        .collect())
}

async fn take_stock(
    tx: &mut Transaction<'_, Postgres>,
    decrement: &StockDecrement,
    lines: &[CartLine],
) -> Result<(), PlaceOrderError> {
    let quantity = i32::try_from(decrement.quantity).unwrap_or(i32::MAX);

    let result = sqlx::query(
        r"
        UPDATE storefront.product_stock
        SET available = available - $3
        WHERE product_id = $1 AND size = $2 AND available >= $3
        ",
    )
    .bind(decrement.product_id)
    .bind(&decrement.size)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let name = lines
            .iter()
            .find(|line| line.product_id == decrement.product_id)
            .map(|line| line.name.clone())
            .unwrap_or_default();
        return Err(CheckoutError::InsufficientStock {
            name,
            size: decrement.size.clone(),
        }
        .into());
    }

    Ok(())
}
