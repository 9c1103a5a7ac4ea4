//! Admin dashboard aggregates.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::Product;
use crate::order::Order;
use crate::types::{Amount, ProductId};

/// Number of orders listed under "recent orders".
pub const RECENT_ORDER_COUNT: usize = 5;

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_revenue: Amount,
    pub total_users: u64,
    pub low_stock_products: Vec<Product>,
    pub recent_orders: Vec<Order>,
    /// Category name to line revenue, for products still in the catalog.
    pub category_sales: BTreeMap<String, Amount>,
    /// `YYYY-MM` to order totals.
    pub monthly_sales: BTreeMap<String, Amount>,
}

/// Aggregate dashboard figures from the full product and order lists.
#[must_use]
pub fn dashboard_stats(products: &[Product], orders: &[Order], total_users: u64) -> DashboardStats {
    let by_id: HashMap<ProductId, &Product> =
        products.iter().map(|p| (p.product_id, p)).collect();

    let mut category_sales: BTreeMap<String, Amount> = BTreeMap::new();
    let mut monthly_sales: BTreeMap<String, Amount> = BTreeMap::new();

    for order in orders {
        for line in &order.items {
            if let Some(product) = by_id.get(&line.product_id) {
                let revenue = line
                    .price
                    .checked_times(line.quantity)
                    .unwrap_or(Amount::new(i64::MAX));
                let entry = category_sales
                    .entry(product.category.to_string())
                    .or_default();
                *entry = *entry + revenue;
            }
        }

        let month = order.created_at.format("%Y-%m").to_string();
        let entry = monthly_sales.entry(month).or_default();
        *entry = *entry + order.total;
    }

    let mut recent_orders = orders.to_vec();
    recent_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_orders.truncate(RECENT_ORDER_COUNT);

    DashboardStats {
        total_products: products.len() as u64,
        total_orders: orders.len() as u64,
        total_revenue: orders.iter().map(|o| o.total).sum(),
        total_users,
        low_stock_products: products
            .iter()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect(),
        recent_orders,
        category_sales,
        monthly_sales,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::catalog::Category;
    use crate::catalog::tests::product;
    use crate::order::OrderLine;
    use crate::order::tests::address;
    use crate::types::{FulfillmentStatus, OrderId, PaymentStatus, UserId};

    fn order(month: u32, day: u32, lines: &[(&Product, u32)]) -> Order {
        let at = Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap();
        let items: Vec<OrderLine> = lines
            .iter()
            .map(|(p, quantity)| OrderLine {
                product_id: p.product_id,
                name: p.name.clone(),
                price: p.price,
                size: "M".to_owned(),
                quantity: *quantity,
                image: p.image.clone(),
            })
            .collect();
        let subtotal: Amount = items
            .iter()
            .map(|l| l.price.checked_times(l.quantity).unwrap())
            .sum();
        Order {
            order_id: OrderId::generate(),
            user_id: UserId::new(1),
            items,
            shipping_address: address(),
            payment_method: "cod".to_owned(),
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::Processing,
            subtotal,
            shipping_cost: Amount::ZERO,
            tax: Amount::ZERO,
            total: subtotal,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_aggregates() {
        let kurti = product("Kurti", 500, &[("M", 3)]);
        let mut saree = product("Saree", 2000, &[("Free Size", 10)]);
        saree.category = Category::Saree;
        let deleted = product("Gone", 999, &[("M", 1)]);

        let orders = vec![
            order(1, 5, &[(&kurti, 2), (&saree, 1)]),
            order(1, 20, &[(&deleted, 1)]),
            order(2, 1, &[(&saree, 2)]),
        ];
        let stats = dashboard_stats(&[kurti.clone(), saree], &orders, 4);

        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_revenue, Amount::new(3000 + 999 + 4000));
        assert_eq!(stats.category_sales["kurti"], Amount::new(1000));
        assert_eq!(stats.category_sales["saree"], Amount::new(6000));
        assert_eq!(stats.monthly_sales["2024-01"], Amount::new(3999));
        assert_eq!(stats.monthly_sales["2024-02"], Amount::new(4000));
        assert_eq!(stats.low_stock_products, [kurti]);
        assert_eq!(stats.recent_orders[0].created_at.format("%m-%d").to_string(), "02-01");
    }

    #[test]
    fn test_recent_orders_are_capped() {
        let kurti = product("Kurti", 500, &[("M", 30)]);
        let orders: Vec<Order> = (1..=8).map(|d| order(3, d, &[(&kurti, 1)])).collect();
        let stats = dashboard_stats(std::slice::from_ref(&kurti), &orders, 1);
        assert_eq!(stats.recent_orders.len(), RECENT_ORDER_COUNT);
        assert!(
            stats
                .recent_orders
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );
    }
}
