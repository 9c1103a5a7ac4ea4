//! Order repository.
//!
//! Line items and the shipping address are stored as `JSONB` snapshots;
//! statuses use the `storefront.payment_status` and
//! `storefront.fulfillment_status` enums.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use elegance_core::order::{Order, OrderLine, OrderStatusUpdate, ShippingAddress};
use elegance_core::{Amount, FulfillmentStatus, OrderId, PaymentStatus, UserId};

use super::RepositoryError;

const ORDER_COLUMNS: &str = r"
    id, user_id, items, shipping_address, payment_method, payment_status,
    fulfillment_status, subtotal, shipping_cost, tax, total, created_at, updated_at
";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    items: Json<Vec<OrderLine>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    payment_status: PaymentStatus,
    fulfillment_status: FulfillmentStatus,
    subtotal: Amount,
    shipping_cost: Amount,
    tax: Amount,
    total: Amount,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            fulfillment_status: row.fulfillment_status,
            subtotal: row.subtotal,
            shipping_cost: row.shipping_cost,
            tax: row.tax,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// Get an order by ID only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// List every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM storefront.orders ORDER BY created_at DESC, id");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Apply a status update and return the updated order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE id = $1 FOR UPDATE");
        let mut order: Order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .into();

        update.apply(&mut order, Utc::now());

        sqlx::query(
            r"
            UPDATE storefront.orders
            SET payment_status = $2, fulfillment_status = $3, updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(order.order_id)
        .bind(order.payment_status)
        .bind(order.fulfillment_status)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }
}

/// Insert an order inside an existing transaction.
pub(crate) async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO storefront.orders (
            id, user_id, items, shipping_address, payment_method, payment_status,
            fulfillment_status, subtotal, shipping_cost, tax, total, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ",
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .bind(Json(&order.items))
    .bind(Json(&order.shipping_address))
    .bind(&order.payment_method)
    .bind(order.payment_status)
    .bind(order.fulfillment_status)
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.tax)
    .bind(order.total)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
