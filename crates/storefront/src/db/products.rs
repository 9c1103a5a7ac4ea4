//! Product repository.
//!
//! Products live in `storefront.product`; their per-size stock lives in
//! `storefront.product_stock` and is folded back into a map when reading.

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use elegance_core::catalog::{
    CatalogError, Category, Product, ProductAttributes, ProductPatch, SizeStock,
};
use elegance_core::{Amount, ProductId};

use super::RepositoryError;

/// Why a product patch was not saved.
#[derive(Debug, Error)]
pub enum UpdateProductError {
    /// The patch failed validation. Nothing was written.
    #[error(transparent)]
    Invalid(#[from] CatalogError),

    /// Storage failed. The transaction was rolled back.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for UpdateProductError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Columns selected for a product, with stock aggregated into a JSON object.
pub(crate) const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.category, p.price, p.image, p.tags, p.attributes,
           COALESCE(
               jsonb_object_agg(s.size, s.available) FILTER (WHERE s.size IS NOT NULL),
               '{}'::jsonb
           ) AS stock
    FROM storefront.product p
    LEFT JOIN storefront.product_stock s ON s.product_id = p.id
";

/// Database row for a product.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    category: String,
    price: Amount,
    image: String,
    tags: Vec<String>,
    attributes: Json<ProductAttributes>,
    stock: Json<SizeStock>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<Category>().map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            product_id: row.id,
            name: row.name,
            category,
            price: row.price,
            image: row.image,
            tags: row.tags,
            stock: row.stock.0,
            attributes: row.attributes.0,
        })
    }
}

pub(crate) fn rows_to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<Category>,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT}
             WHERE ($1::text IS NULL OR p.category = $1)
             GROUP BY p.id
             ORDER BY p.created_at DESC, p.name
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category.map(Category::as_str))
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows_to_products(rows)
    }

    /// List every product sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} GROUP BY p.id ORDER BY p.name, p.id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        rows_to_products(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a new product with its stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO storefront.product (id, name, category, price, image, tags, attributes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(product.product_id)
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.tags)
        .bind(Json(&product.attributes))
        .execute(&mut *tx)
        .await
        .map_err(|e| super::map_unique_violation(e, "product"))?;

        write_stock(&mut tx, product.product_id, &product.stock).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Merge `patch` into a stored product.
    ///
    /// The product row and its stock rows are locked while the patch is
    /// applied, so a concurrent checkout is either fully visible or waits.
    /// Stock rows are only rewritten when the patch carries a stock map.
    ///
    /// # Errors
    ///
    /// Returns `UpdateProductError::Invalid` if the patch is rejected.
    /// Returns `UpdateProductError::Repository` with `RepositoryError::NotFound`
    /// if the product doesn't exist, or a database error.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, UpdateProductError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, ProductId>(
            "SELECT id FROM storefront.product WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            "SELECT 1 FROM storefront.product_stock WHERE product_id = $1 ORDER BY size FOR UPDATE",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let mut product = Product::try_from(row)?;

        let restock = patch.stock.is_some();
        product.apply_patch(patch)?;

        sqlx::query(
            r"
            UPDATE storefront.product
            SET name = $2, category = $3, price = $4, image = $5, tags = $6,
                attributes = $7, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.tags)
        .bind(Json(&product.attributes))
        .execute(&mut *tx)
        .await?;

        if restock {
            sqlx::query("DELETE FROM storefront.product_stock WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            write_stock(&mut tx, id, &product.stock).await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Delete a product. Existing orders keep their own line snapshots.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn write_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    stock: &SizeStock,
) -> Result<(), RepositoryError> {
    for (size, available) in stock {
        let available = i32::try_from(*available).map_err(|_| {
            RepositoryError::DataCorruption(format!("stock for size {size} is out of range"))
        })?;
        sqlx::query(
            r"
            INSERT INTO storefront.product_stock (product_id, size, available)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(product_id)
        .bind(size)
        .bind(available)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
