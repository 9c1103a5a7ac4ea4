//! Checkout planning.
//!
//! [`plan_checkout`] validates a cart against current product snapshots and
//! computes the order lines, stock decrements and totals. It performs no I/O:
//! the storefront runs it inside a database transaction and then applies the
//! decrements with conditional updates.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::cart::Cart;
use crate::catalog::Product;
use crate::order::{Order, OrderError, OrderLine, ShippingAddress};
use crate::pricing::{OrderTotals, PricingPolicy};
use crate::types::{Amount, FulfillmentStatus, OrderId, PaymentStatus, ProductId, UserId};

/// Reasons a checkout is refused. None of them leave side effects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Shipping address and payment method are required")]
    MissingDetails,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product {name} not found")]
    ProductNotFound { name: String },

    #[error("Size {size} for {name} is not available")]
    SizeUnavailable { name: String, size: String },

    #[error("Not enough stock for {name} in size {size}")]
    InsufficientStock { name: String, size: String },

    #[error("Order total is too large")]
    AmountOverflow,
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MissingField(field) => Self::MissingField(field),
        }
    }
}

/// Shipping and payment details submitted with a checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
}

impl CheckoutRequest {
    /// Validate the request and return its address and payment method.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingDetails`] if either part is absent, or
    /// [`CheckoutError::MissingField`] for a blank address field.
    pub fn validate(self) -> Result<(ShippingAddress, String), CheckoutError> {
        let payment_method = self
            .payment_method
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty());
        let (Some(address), Some(payment_method)) = (self.shipping_address, payment_method) else {
            return Err(CheckoutError::MissingDetails);
        };
        address.validate()?;
        Ok((address, payment_method))
    }
}

/// Units to take from one product size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
}

/// The validated outcome of a checkout, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<OrderLine>,
    /// One entry per distinct product and size, in a stable order.
    pub decrements: Vec<StockDecrement>,
    pub totals: OrderTotals,
}

impl CheckoutPlan {
    /// Build the order record for this plan. Payment is recorded as paid and
    /// fulfillment starts at processing.
    #[must_use]
    pub fn into_order(
        self,
        user_id: UserId,
        shipping_address: ShippingAddress,
        payment_method: String,
        now: DateTime<Utc>,
    ) -> Order {
        Order {
            order_id: OrderId::generate(),
            user_id,
            items: self.lines,
            shipping_address,
            payment_method,
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::Processing,
            subtotal: self.totals.subtotal,
            shipping_cost: self.totals.shipping_cost,
            tax: self.totals.tax,
            total: self.totals.total,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validate `cart` against `products` (current snapshots keyed by id) and
/// price it with `pricing`.
///
/// Lines are priced at the unit price cached on the cart line. Lines sharing
/// a product and size are checked against stock as one combined quantity.
///
/// # Errors
///
/// Returns a [`CheckoutError`] describing the first problem found.
pub fn plan_checkout(
    cart: &Cart,
    products: &HashMap<ProductId, Product>,
    pricing: &PricingPolicy,
) -> Result<CheckoutPlan, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut requested: BTreeMap<(ProductId, &str), u32> = BTreeMap::new();
    let mut lines = Vec::with_capacity(cart.items.len());
    let mut subtotal = Amount::ZERO;

    for item in &cart.items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| CheckoutError::ProductNotFound {
                name: item.name.clone(),
            })?;

        let available = product.available(&item.size);
        if available == 0 {
            return Err(CheckoutError::SizeUnavailable {
                name: item.name.clone(),
                size: item.size.clone(),
            });
        }

        let wanted = requested
            .entry((item.product_id, item.size.as_str()))
            .or_insert(0);
        *wanted = wanted.saturating_add(item.quantity);
        if *wanted > available {
            return Err(CheckoutError::InsufficientStock {
                name: item.name.clone(),
                size: item.size.clone(),
            });
        }

        let line_total = item
            .price
            .checked_times(item.quantity)
            .ok_or(CheckoutError::AmountOverflow)?;
        subtotal = Amount::new(
            subtotal
                .units()
                .checked_add(line_total.units())
                .ok_or(CheckoutError::AmountOverflow)?,
        );

        lines.push(OrderLine {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            size: item.size.clone(),
            quantity: item.quantity,
            image: item.image.clone(),
        });
    }

    let totals = pricing
        .quote(subtotal)
        .ok_or(CheckoutError::AmountOverflow)?;
    let decrements = requested
        .into_iter()
        .map(|((product_id, size), quantity)| StockDecrement {
            product_id,
            size: size.to_owned(),
            quantity,
        })
        .collect();

    Ok(CheckoutPlan {
        lines,
        decrements,
        totals,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::catalog::tests::product;
    use crate::order::tests::address;

    fn catalog(products: &[&Product]) -> HashMap<ProductId, Product> {
        products
            .iter()
            .map(|p| (p.product_id, (*p).clone()))
            .collect()
    }

    fn cart_with(lines: &[(&Product, &str, u32)]) -> Cart {
        let mut cart = Cart::empty(UserId::new(1), Utc::now());
        cart.items = lines
            .iter()
            .map(|(p, size, quantity)| CartLine {
                product_id: p.product_id,
                name: p.name.clone(),
                size: (*size).to_owned(),
                quantity: *quantity,
                price: p.price,
                image: p.image.clone(),
                max_available: p.available(size),
            })
            .collect();
        cart
    }

    #[test]
    fn test_small_order_pays_shipping() {
        let kurti = product("Kurti", 400, &[("M", 3)]);
        let cart = cart_with(&[(&kurti, "M", 2)]);
        let plan = plan_checkout(&cart, &catalog(&[&kurti]), &PricingPolicy::default()).unwrap();

        assert_eq!(plan.totals.subtotal, Amount::new(800));
        assert_eq!(plan.totals.shipping_cost, Amount::new(100));
        assert_eq!(plan.totals.tax, Amount::new(144));
        assert_eq!(plan.totals.total, Amount::new(1044));
        assert_eq!(
            plan.decrements,
            [StockDecrement {
                product_id: kurti.product_id,
                size: "M".to_owned(),
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_large_order_ships_free() {
        let saree = product("Saree", 2500, &[("Free Size", 1)]);
        let cart = cart_with(&[(&saree, "Free Size", 1)]);
        let plan = plan_checkout(&cart, &catalog(&[&saree]), &PricingPolicy::default()).unwrap();
        assert_eq!(plan.totals.tax, Amount::new(450));
        assert_eq!(plan.totals.shipping_cost, Amount::ZERO);
        assert_eq!(plan.totals.total, Amount::new(2950));
    }

    #[test]
    fn test_quantity_equal_to_stock_succeeds() {
        let gown = product("Gown", 3000, &[("L", 2)]);
        let cart = cart_with(&[(&gown, "L", 2)]);
        assert!(plan_checkout(&cart, &catalog(&[&gown]), &PricingPolicy::default()).is_ok());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let cart = Cart::empty(UserId::new(1), Utc::now());
        assert_eq!(
            plan_checkout(&cart, &HashMap::new(), &PricingPolicy::default()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_any_over_quantity_line_fails_whole_checkout() {
        let a = product("A", 100, &[("S", 5)]);
        let b = product("B", 100, &[("S", 1)]);
        let cart = cart_with(&[(&a, "S", 1), (&b, "S", 2)]);
        assert_eq!(
            plan_checkout(&cart, &catalog(&[&a, &b]), &PricingPolicy::default()),
            Err(CheckoutError::InsufficientStock {
                name: "B".to_owned(),
                size: "S".to_owned(),
            })
        );
    }

    #[test]
    fn test_missing_product_and_sold_out_size() {
        let a = product("A", 100, &[("S", 0), ("M", 1)]);
        let cart = cart_with(&[(&a, "M", 1)]);
        assert!(matches!(
            plan_checkout(&cart, &HashMap::new(), &PricingPolicy::default()),
            Err(CheckoutError::ProductNotFound { .. })
        ));

        let cart = cart_with(&[(&a, "S", 1)]);
        assert!(matches!(
            plan_checkout(&cart, &catalog(&[&a]), &PricingPolicy::default()),
            Err(CheckoutError::SizeUnavailable { .. })
        ));
    }

    #[test]
    fn test_uses_cached_cart_price() {
        let mut kurti = product("Kurti", 500, &[("M", 3)]);
        let cart = cart_with(&[(&kurti, "M", 1)]);
        kurti.price = Amount::new(900);
        let plan = plan_checkout(&cart, &catalog(&[&kurti]), &PricingPolicy::default()).unwrap();
        assert_eq!(plan.totals.subtotal, Amount::new(500));
        assert_eq!(plan.lines[0].price, Amount::new(500));
    }

    #[test]
    fn test_duplicate_lines_are_checked_together() {
        let kurti = product("Kurti", 500, &[("M", 3)]);
        let cart = cart_with(&[(&kurti, "M", 2), (&kurti, "M", 2)]);
        assert!(matches!(
            plan_checkout(&cart, &catalog(&[&kurti]), &PricingPolicy::default()),
            Err(CheckoutError::InsufficientStock { .. })
        ));

        let cart = cart_with(&[(&kurti, "M", 1), (&kurti, "M", 2)]);
        let plan = plan_checkout(&cart, &catalog(&[&kurti]), &PricingPolicy::default()).unwrap();
        assert_eq!(plan.decrements.len(), 1);
        assert_eq!(plan.decrements[0].quantity, 3);
    }

    #[test]
    fn test_into_order_sets_initial_statuses() {
        let kurti = product("Kurti", 400, &[("M", 3)]);
        let cart = cart_with(&[(&kurti, "M", 1)]);
        let plan = plan_checkout(&cart, &catalog(&[&kurti]), &PricingPolicy::default()).unwrap();
        let order = plan.into_order(UserId::new(1), address(), "upi".to_owned(), Utc::now());
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Processing);
        assert_eq!(order.total, order.subtotal + order.shipping_cost + order.tax);
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_request_validation() {
        let missing = CheckoutRequest {
            shipping_address: Some(address()),
            payment_method: Some("  ".to_owned()),
        };
        assert_eq!(missing.validate(), Err(CheckoutError::MissingDetails));

        let mut blank_city = address();
        blank_city.city = String::new();
        let request = CheckoutRequest {
            shipping_address: Some(blank_city),
            payment_method: Some("card".to_owned()),
        };
        assert_eq!(request.validate(), Err(CheckoutError::MissingField("city")));
    }
}
