//! Public catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::ProductId;
use elegance_core::catalog::{Category, Product};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Products returned when no limit is given.
pub const DEFAULT_LIMIT: i64 = 12;

/// Upper bound on the `limit` query parameter.
pub const MAX_LIMIT: i64 = 100;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
}

impl ProductQuery {
    fn category(&self) -> Result<Option<Category>> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::parse::<Category>)
            .transpose()
            .map_err(AppError::from)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// List products, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(query.category()?, query.limit())
        .await?;
    Ok(Json(products))
}

/// Get one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(ProductQuery::default().limit(), DEFAULT_LIMIT);
        let query = ProductQuery {
            limit: Some(500),
            ..ProductQuery::default()
        };
        assert_eq!(query.limit(), MAX_LIMIT);
        let query = ProductQuery {
            limit: Some(0),
            ..ProductQuery::default()
        };
        assert_eq!(query.limit(), 1);
    }

    #[test]
    fn test_category_filter_parsing() {
        let query = ProductQuery {
            category: Some("Saree".to_owned()),
            ..ProductQuery::default()
        };
        assert_eq!(query.category().unwrap(), Some(Category::Saree));

        let query = ProductQuery {
            category: Some("  ".to_owned()),
            ..ProductQuery::default()
        };
        assert_eq!(query.category().unwrap(), None);

        let query = ProductQuery {
            category: Some("shoes".to_owned()),
            ..ProductQuery::default()
        };
        assert!(matches!(query.category(), Err(AppError::Catalog(_))));
    }
}
