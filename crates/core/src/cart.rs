//! Shopping cart.
//!
//! Each user owns at most one cart. Lines are keyed by product and size, and
//! carry a snapshot of the product's name, unit price, image and the stock
//! that was available the last time the line changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{Amount, ProductId, UserId};

/// Errors raised by cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("product not found")]
    ProductNotFound,

    #[error("size {size} is not available")]
    SizeUnavailable { size: String },

    #[error("only {available} left in size {size} of {name}")]
    InsufficientStock {
        name: String,
        size: String,
        available: u32,
    },

    #[error("item not found in cart")]
    LineNotFound,
}

/// One product+size entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    /// Unit price at the time the line was added.
    pub price: Amount,
    pub image: String,
    /// Stock observed when the line last changed.
    pub max_available: u32,
}

impl CartLine {
    /// Unit price times quantity, saturating on overflow.
    #[must_use]
    pub fn line_total(&self) -> Amount {
        self.price
            .checked_times(self.quantity)
            .unwrap_or(Amount::new(i64::MAX))
    }

    fn matches(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartLine>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// A new cart with no lines.
    #[must_use]
    pub const fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of line totals at cached prices.
    #[must_use]
    pub fn subtotal(&self) -> Amount {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Add `quantity` units of `product` in `size`, merging with an existing
    /// line for the same product and size.
    ///
    /// The merged quantity may not exceed the product's current stock for
    /// that size. On success the line's `max_available` snapshot is
    /// refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a quantity below 1,
    /// [`CartError::SizeUnavailable`] if the size has no stock, or
    /// [`CartError::InsufficientStock`] if the merged quantity is too large.
    pub fn add(
        &mut self,
        product: &Product,
        size: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|&q| q >= 1)
            .ok_or(CartError::InvalidQuantity)?;

        let available = product.available(size);
        if available == 0 {
            return Err(CartError::SizeUnavailable {
                size: size.to_owned(),
            });
        }

        let existing = self
            .items
            .iter()
            .position(|l| l.matches(product.product_id, size));
        let current = existing.map_or(0, |i| self.items[i].quantity);
        let merged = current.saturating_add(quantity);
        if merged > available {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                size: size.to_owned(),
                available,
            });
        }

        match existing {
            Some(i) => {
                let line = &mut self.items[i];
                line.quantity = merged;
                line.max_available = available;
            }
            None => self.items.push(CartLine {
                product_id: product.product_id,
                name: product.name.clone(),
                size: size.to_owned(),
                quantity,
                price: product.price,
                image: product.image.clone(),
                max_available: available,
            }),
        }
        self.updated_at = now;
        Ok(())
    }

    /// Set the quantity of an existing line. A quantity of zero or less
    /// removes the line.
    ///
    /// `product` is the current catalog entry for the line, or `None` if it
    /// has been deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the cart has no such line,
    /// [`CartError::ProductNotFound`] if the product is gone, or
    /// [`CartError::InsufficientStock`] if the quantity exceeds stock.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        size: &str,
        quantity: i64,
        product: Option<&Product>,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        let index = self
            .items
            .iter()
            .position(|l| l.matches(product_id, size))
            .ok_or(CartError::LineNotFound)?;

        if quantity <= 0 {
            self.items.remove(index);
            self.updated_at = now;
            return Ok(());
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let product = product.ok_or(CartError::ProductNotFound)?;
        let available = product.available(size);
        if quantity > available {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                size: size.to_owned(),
                available,
            });
        }

        let line = &mut self.items[index];
        line.quantity = quantity;
        line.max_available = available;
        self.updated_at = now;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the cart has no such line.
    pub fn remove(
        &mut self,
        product_id: ProductId,
        size: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        self.set_quantity(product_id, size, 0, None, now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::catalog::tests::product;

    fn cart() -> Cart {
        Cart::empty(UserId::new(1), Utc::now())
    }

    #[test]
    fn test_add_same_line_twice_merges() {
        let p = product("Kurti", 900, &[("M", 5)]);
        let mut cart = cart();
        cart.add(&p, "M", 2, Utc::now()).unwrap();
        cart.add(&p, "M", 3, Utc::now()).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].max_available, 5);
    }

    #[test]
    fn test_merge_cannot_exceed_stock() {
        let p = product("Kurti", 900, &[("M", 5)]);
        let mut cart = cart();
        cart.add(&p, "M", 4, Utc::now()).unwrap();
        let err = cart.add(&p, "M", 2, Utc::now()).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 5, .. }));
        assert_eq!(cart.items[0].quantity, 4);
    }

    #[test]
    fn test_add_rejects_bad_quantity_and_missing_size() {
        let p = product("Saree", 2500, &[("Free Size", 1), ("XL", 0)]);
        let mut cart = cart();
        assert_eq!(
            cart.add(&p, "Free Size", 0, Utc::now()),
            Err(CartError::InvalidQuantity)
        );
        assert_eq!(
            cart.add(&p, "Free Size", -3, Utc::now()),
            Err(CartError::InvalidQuantity)
        );
        assert!(matches!(
            cart.add(&p, "XL", 1, Utc::now()),
            Err(CartError::SizeUnavailable { .. })
        ));
        assert!(matches!(
            cart.add(&p, "S", 1, Utc::now()),
            Err(CartError::SizeUnavailable { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_different_sizes_are_separate_lines() {
        let p = product("Kurti", 900, &[("M", 5), ("L", 5)]);
        let mut cart = cart();
        cart.add(&p, "M", 1, Utc::now()).unwrap();
        cart.add(&p, "L", 2, Utc::now()).unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Amount::new(2700));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let p = product("Kurti", 900, &[("M", 5)]);
        let mut cart = cart();
        cart.add(&p, "M", 2, Utc::now()).unwrap();
        cart.set_quantity(p.product_id, "M", 0, Some(&p), Utc::now())
            .unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_checks_current_stock() {
        let mut p = product("Kurti", 900, &[("M", 5)]);
        let mut cart = cart();
        cart.add(&p, "M", 2, Utc::now()).unwrap();
        p.stock.insert("M".to_owned(), 3);

        assert!(matches!(
            cart.set_quantity(p.product_id, "M", 4, Some(&p), Utc::now()),
            Err(CartError::InsufficientStock { available: 3, .. })
        ));
        cart.set_quantity(p.product_id, "M", 3, Some(&p), Utc::now())
            .unwrap();
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].max_available, 3);
    }

    #[test]
    fn test_set_quantity_missing_line_or_product() {
        let p = product("Kurti", 900, &[("M", 5)]);
        let mut cart = cart();
        assert_eq!(
            cart.set_quantity(p.product_id, "M", 1, Some(&p), Utc::now()),
            Err(CartError::LineNotFound)
        );
        cart.add(&p, "M", 1, Utc::now()).unwrap();
        assert_eq!(
            cart.set_quantity(p.product_id, "M", 2, None, Utc::now()),
            Err(CartError::ProductNotFound)
        );
        // Removal still works once the product is gone.
        cart.remove(p.product_id, "M", Utc::now()).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_mutations_restamp_updated_at() {
        let p = product("Kurti", 900, &[("M", 5)]);
        let start = Utc::now() - Duration::hours(1);
        let mut cart = Cart::empty(UserId::new(1), start);
        let later = start + Duration::minutes(30);
        cart.add(&p, "M", 1, later).unwrap();
        assert_eq!(cart.updated_at, later);
    }
}
