//! Seed the catalog from a YAML file.
//!
//! The file holds a `products` list in the same shape the admin API accepts
//! for product creation:
//!
//! ```yaml
//! products:
//!   - name: Banarasi Silk Saree
//!     category: saree
//!     price: 4999
//!     image: /images/banarasi.jpg
//!     tags: [silk, wedding]
//!     stock: { Free Size: 10 }
//!     attributes:
//!       color: Red
//!       material: Silk
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use elegance_core::catalog::{NewProduct, Product};
use elegance_storefront::db::ProductRepository;

use super::connect;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<NewProduct>,
}

/// Parse and validate a catalog document.
///
/// Every entry is checked before anything is written; the error lists each
/// invalid entry by position and name.
fn parse_catalog(content: &str) -> Result<Vec<Product>, String> {
    let file: CatalogFile = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

    let mut products = Vec::with_capacity(file.products.len());
    let mut errors = Vec::new();
    for (index, entry) in file.products.into_iter().enumerate() {
        let label = entry.name.clone().unwrap_or_else(|| "<unnamed>".to_owned());
        match entry.into_product() {
            Ok(product) => products.push(product),
            Err(e) => errors.push(format!("#{} ({label}): {e}", index + 1)),
        }
    }

    if errors.is_empty() {
        Ok(products)
    } else {
        for err in &errors {
            error!("  - {err}");
        }
        Err(format!("{} invalid catalog entries", errors.len()))
    }
}

/// Seed products from a YAML file.
///
/// Does nothing if the catalog already has products, unless `force` is set.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, an entry is
/// invalid, or a database operation fails.
pub async fn products(file_path: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_catalog(&content)?;
    info!(products = products.len(), "Catalog validated");

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let existing = repo.count().await?;
    if existing > 0 && !force {
        warn!(existing, "Catalog already has products; use --force to seed anyway");
        return Ok(());
    }

    for product in &products {
        repo.create(product).await?;
        info!(id = %product.product_id, name = %product.name, "Created product");
    }

    info!(created = products.len(), "Seeding complete");
    Ok(())
}
