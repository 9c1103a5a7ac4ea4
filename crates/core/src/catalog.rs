//! Product catalog entities.
//!
//! A [`Product`] carries its per-size stock as a [`SizeStock`] map. Counts are
//! unsigned, so a negative stock level cannot be represented.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Amount, ProductId};

/// Image used when a product is created without one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=600&width=450";

/// Stock level under which a size counts as running low on the dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Available units per size label (e.g. `"M"`, `"Free Size"`).
pub type SizeStock = BTreeMap<String, u32>;

/// Errors raised when validating catalog input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A required field is missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Price must be greater than zero.
    #[error("price must be greater than zero")]
    InvalidPrice,

    /// A size label in the stock map is blank.
    #[error("size labels cannot be blank")]
    BlankSize,

    /// Unknown category name.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "saree")]
    Saree,
    #[serde(rename = "kurti")]
    Kurti,
    #[serde(rename = "plus size kurti")]
    PlusSizeKurti,
    #[serde(rename = "gowns")]
    Gowns,
    #[serde(rename = "kurta set")]
    KurtaSet,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 5] = [
        Self::Saree,
        Self::Kurti,
        Self::PlusSizeKurti,
        Self::Gowns,
        Self::KurtaSet,
    ];

    /// The stored name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Saree => "saree",
            Self::Kurti => "kurti",
            Self::PlusSizeKurti => "plus size kurti",
            Self::Gowns => "gowns",
            Self::KurtaSet => "kurta set",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_owned()))
    }
}

/// Descriptive attributes shown on the product page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductAttributes {
    pub color: String,
    pub collection: String,
    pub material: String,
    pub work: String,
    pub occasion: Vec<String>,
    pub wash_care: String,
    /// Length in metres.
    pub length: Option<f64>,
    /// Blouse piece length in metres.
    pub blouse: Option<f64>,
    pub pattern: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub category: Category,
    pub price: Amount,
    pub image: String,
    pub tags: Vec<String>,
    pub stock: SizeStock,
    pub attributes: ProductAttributes,
}

impl Product {
    /// Units available in `size`, zero when the size is not stocked.
    #[must_use]
    pub fn available(&self, size: &str) -> u32 {
        self.stock.get(size).copied().unwrap_or(0)
    }

    /// Whether any size is in stock but below [`LOW_STOCK_THRESHOLD`].
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.stock
            .values()
            .any(|&n| n > 0 && n < LOW_STOCK_THRESHOLD)
    }

    /// Merge the provided fields into this product.
    ///
    /// The identifier never changes. The patch is validated as a whole before
    /// anything is applied.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a provided field is invalid.
    pub fn apply_patch(&mut self, patch: ProductPatch) -> Result<(), CatalogError> {
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(CatalogError::MissingField("name"));
        }
        if let Some(price) = patch.price
            && !price.is_positive()
        {
            return Err(CatalogError::InvalidPrice);
        }
        if let Some(stock) = &patch.stock {
            validate_stock(stock)?;
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_owned();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(attributes) = patch.attributes {
            self.attributes = attributes;
        }
        Ok(())
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Amount>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub stock: Option<SizeStock>,
    pub attributes: Option<ProductAttributes>,
}

impl NewProduct {
    /// Validate the input and mint a product with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingField`] naming the first missing field,
    /// or another [`CatalogError`] for invalid values.
    pub fn into_product(self) -> Result<Product, CatalogError> {
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or(CatalogError::MissingField("name"))?;
        let category = self.category.ok_or(CatalogError::MissingField("category"))?;
        let price = self.price.ok_or(CatalogError::MissingField("price"))?;
        if !price.is_positive() {
            return Err(CatalogError::InvalidPrice);
        }
        let stock = self.stock.ok_or(CatalogError::MissingField("stock"))?;
        validate_stock(&stock)?;
        let attributes = self
            .attributes
            .ok_or(CatalogError::MissingField("attributes"))?;

        Ok(Product {
            product_id: ProductId::generate(),
            name,
            category,
            price,
            image: self
                .image
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()),
            tags: self.tags.unwrap_or_default(),
            stock,
            attributes,
        })
    }
}

/// Partial update of a product; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Amount>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub stock: Option<SizeStock>,
    pub attributes: Option<ProductAttributes>,
}

fn validate_stock(stock: &SizeStock) -> Result<(), CatalogError> {
    if stock.is_empty() {
        return Err(CatalogError::MissingField("stock"));
    }
    if stock.keys().any(|size| size.trim().is_empty()) {
        return Err(CatalogError::BlankSize);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Build a product with the given stock for tests across the crate.
    pub(crate) fn product(name: &str, price: i64, stock: &[(&str, u32)]) -> Product {
        Product {
            product_id: ProductId::generate(),
            name: name.to_owned(),
            category: Category::Kurti,
            price: Amount::new(price),
            image: PLACEHOLDER_IMAGE.to_owned(),
            tags: Vec::new(),
            stock: stock.iter().map(|(s, n)| ((*s).to_owned(), *n)).collect(),
            attributes: ProductAttributes::default(),
        }
    }

    fn new_product() -> NewProduct {
        NewProduct {
            name: Some("  Printed Cotton Kurti ".to_owned()),
            category: Some(Category::Kurti),
            price: Some(Amount::new(1499)),
            stock: Some(SizeStock::from([("M".to_owned(), 8)])),
            attributes: Some(ProductAttributes::default()),
            ..NewProduct::default()
        }
    }

    #[test]
    fn test_into_product_applies_defaults() {
        let product = new_product().into_product().unwrap();
        assert_eq!(product.name, "Printed Cotton Kurti");
        assert_eq!(product.image, PLACEHOLDER_IMAGE);
        assert!(product.tags.is_empty());
    }

    #[test]
    fn test_into_product_names_missing_field() {
        let input = NewProduct {
            attributes: None,
            ..new_product()
        };
        assert_eq!(
            input.into_product(),
            Err(CatalogError::MissingField("attributes"))
        );
    }

    #[test]
    fn test_into_product_rejects_zero_price() {
        let input = NewProduct {
            price: Some(Amount::ZERO),
            ..new_product()
        };
        assert_eq!(input.into_product(), Err(CatalogError::InvalidPrice));
    }

    #[test]
    fn test_patch_keeps_id_and_untouched_fields() {
        let mut product = product("Gown", 3999, &[("S", 2)]);
        let id = product.product_id;
        product
            .apply_patch(ProductPatch {
                price: Some(Amount::new(3499)),
                ..ProductPatch::default()
            })
            .unwrap();
        assert_eq!(product.product_id, id);
        assert_eq!(product.price, Amount::new(3499));
        assert_eq!(product.name, "Gown");
    }

    #[test]
    fn test_invalid_patch_changes_nothing() {
        let mut product = product("Gown", 3999, &[("S", 2)]);
        let before = product.clone();
        let result = product.apply_patch(ProductPatch {
            name: Some("Renamed".to_owned()),
            stock: Some(SizeStock::from([(" ".to_owned(), 1)])),
            ..ProductPatch::default()
        });
        assert_eq!(result, Err(CatalogError::BlankSize));
        assert_eq!(product, before);
    }

    #[test]
    fn test_low_stock_ignores_sold_out_sizes() {
        assert!(product("a", 1, &[("S", 4), ("M", 10)]).is_low_stock());
        assert!(!product("b", 1, &[("S", 0), ("M", 10)]).is_low_stock());
    }

    #[test]
    fn test_category_round_trip() {
        assert_eq!(
            "Plus Size Kurti".parse::<Category>(),
            Ok(Category::PlusSizeKurti)
        );
        assert_eq!(
            serde_json::to_string(&Category::KurtaSet).unwrap(),
            "\"kurta set\""
        );
        assert!("lehenga".parse::<Category>().is_err());
    }
}
