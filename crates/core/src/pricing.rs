//! Order pricing: shipping and tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Amount;

/// Store-wide pricing rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Tax rate applied to the subtotal (e.g. `0.18`).
    pub tax_rate: Decimal,
    /// Orders with a subtotal strictly above this ship for free.
    pub free_shipping_threshold: Amount,
    /// Shipping fee charged at or below the threshold.
    pub flat_shipping_fee: Amount,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(18, 2),
            free_shipping_threshold: Amount::new(1000),
            flat_shipping_fee: Amount::new(100),
        }
    }
}

/// Totals charged for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Amount,
    pub shipping_cost: Amount,
    pub tax: Amount,
    pub total: Amount,
}

impl PricingPolicy {
    /// Shipping fee for a subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Amount) -> Amount {
        if subtotal > self.free_shipping_threshold {
            Amount::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Compute shipping, tax and total for a subtotal.
    ///
    /// Returns `None` if the tax does not fit in an [`Amount`].
    ///
    /// ```
    /// use elegance_core::Amount;
    /// use elegance_core::pricing::PricingPolicy;
    ///
    /// let totals = PricingPolicy::default().quote(Amount::new(800)).unwrap();
    /// assert_eq!(totals.shipping_cost, Amount::new(100));
    /// assert_eq!(totals.tax, Amount::new(144));
    /// assert_eq!(totals.total, Amount::new(1044));
    /// ```
    #[must_use]
    pub fn quote(&self, subtotal: Amount) -> Option<OrderTotals> {
        let shipping_cost = self.shipping_for(subtotal);
        let tax = subtotal.apply_rate(self.tax_rate)?;
        Some(OrderTotals {
            subtotal,
            shipping_cost,
            tax,
            total: subtotal + shipping_cost + tax,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_large_subtotal_ships_free() {
        let totals = PricingPolicy::default().quote(Amount::new(2500)).unwrap();
        assert_eq!(totals.shipping_cost, Amount::ZERO);
        assert_eq!(totals.tax, Amount::new(450));
        assert_eq!(totals.total, Amount::new(2950));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping_for(Amount::new(1000)), Amount::new(100));
        assert_eq!(policy.shipping_for(Amount::new(1001)), Amount::ZERO);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            tax_rate: Decimal::new(5, 2),
            free_shipping_threshold: Amount::new(500),
            flat_shipping_fee: Amount::new(49),
        };
        let totals = policy.quote(Amount::new(450)).unwrap();
        // 450 * 0.05 = 22.5 -> 23
        assert_eq!(totals.tax, Amount::new(23));
        assert_eq!(totals.total, Amount::new(450 + 49 + 23));
    }
}
