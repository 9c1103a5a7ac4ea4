//! Orders.
//!
//! An [`Order`] is an immutable snapshot taken at checkout. Only its payment
//! and fulfillment statuses change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::first_blank;
use crate::types::{Amount, FulfillmentStatus, OrderId, PaymentStatus, ProductId, UserId};

/// Errors raised when validating order input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A purchased line, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Amount,
    pub size: String,
    pub quantity: u32,
    pub image: String,
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Check that every field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::MissingField`] naming the first blank field.
    pub fn validate(&self) -> Result<(), OrderError> {
        match first_blank(&[
            ("name", &self.name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]) {
            Some(field) => Err(OrderError::MissingField(field)),
            None => Ok(()),
        }
    }
}

/// A completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    #[serde(rename = "orderStatus")]
    pub fulfillment_status: FulfillmentStatus,
    pub subtotal: Amount,
    pub shipping_cost: Amount,
    pub tax: Amount,
    pub total: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin update of an order's statuses. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub payment_status: Option<PaymentStatus>,
    #[serde(rename = "orderStatus")]
    pub fulfillment_status: Option<FulfillmentStatus>,
}

impl OrderStatusUpdate {
    /// Apply the provided fields and re-stamp `updated_at`, even when no
    /// field is set.
    pub fn apply(self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(status) = self.payment_status {
            order.payment_status = status;
        }
        if let Some(status) = self.fulfillment_status {
            order.fulfillment_status = status;
        }
        order.updated_at = now;
    }
}
