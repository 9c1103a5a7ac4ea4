//! Saved-for-later products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{Amount, ProductId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WishlistError {
    #[error("item already in wishlist")]
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Amount,
    pub image: String,
    pub added_at: DateTime<Utc>,
}

/// A user's wishlist. Each product appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    pub user_id: UserId,
    pub items: Vec<WishlistItem>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    #[must_use]
    pub const fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            updated_at: now,
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    /// Save `product`.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::AlreadyPresent`] if the product is already
    /// saved.
    pub fn add(&mut self, product: &Product, now: DateTime<Utc>) -> Result<(), WishlistError> {
        if self.contains(product.product_id) {
            return Err(WishlistError::AlreadyPresent);
        }
        self.items.push(WishlistItem {
            product_id: product.product_id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            added_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Drop `product_id` from the list. Removing an absent product is a no-op
    /// apart from the timestamp.
    pub fn remove(&mut self, product_id: ProductId, now: DateTime<Utc>) {
        self.items.retain(|i| i.product_id != product_id);
        self.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_duplicate_add_is_rejected() {
        let p = product("Gown", 4200, &[("M", 1)]);
        let mut list = Wishlist::empty(UserId::new(3), Utc::now());
        list.add(&p, Utc::now()).unwrap();
        assert_eq!(list.add(&p, Utc::now()), Err(WishlistError::AlreadyPresent));
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].price, Amount::new(4200));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let p = product("Gown", 4200, &[("M", 1)]);
        let mut list = Wishlist::empty(UserId::new(3), Utc::now());
        list.add(&p, Utc::now()).unwrap();
        list.remove(ProductId::generate(), Utc::now());
        assert!(list.contains(p.product_id));
        list.remove(p.product_id, Utc::now());
        assert!(list.items.is_empty());
    }
}
