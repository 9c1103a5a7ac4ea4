//! Checkout against a real database.
//!
//! These tests require a `PostgreSQL` database named by `DATABASE_URL`.
//!
//! Run with: `cargo test -p elegance-integration-tests -- --ignored`

use chrono::Utc;
use sqlx::PgPool;

use elegance_core::catalog::{Product, ProductPatch};
use elegance_core::checkout::CheckoutError;
use elegance_core::order::{Order, ShippingAddress};
use elegance_core::pricing::PricingPolicy;
use elegance_core::{Amount, PaymentStatus, UserId};
use elegance_integration_tests::{create_product, create_user, database_pool, stock_of};
use elegance_storefront::db::checkout::PlaceOrderError;
use elegance_storefront::db::{
    CartRepository, CheckoutRepository, OrderRepository, ProductRepository,
};
use elegance_storefront::error::AppError;

fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Rao".to_owned(),
        phone: "+91 98450 12345".to_owned(),
        street: "12 MG Road".to_owned(),
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        postal_code: "560001".to_owned(),
        country: "India".to_owned(),
    }
}

async fn fill_cart(pool: &PgPool, user_id: UserId, lines: &[(&Product, &str, i64)]) {
    let carts = CartRepository::new(pool);
    carts.get_or_create(user_id).await.expect("create cart");
    carts
        .modify(user_id, |cart| {
            for (product, size, quantity) in lines {
                cart.add(product, size, *quantity, Utc::now())?;
            }
            Ok::<_, AppError>(())
        })
        .await
        .expect("fill cart");
}

async fn checkout(pool: &PgPool, user_id: UserId) -> Result<Order, PlaceOrderError> {
    CheckoutRepository::new(pool)
        .place_order(user_id, address(), "cod".to_owned(), &PricingPolicy::default())
        .await
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_records_order_takes_stock_and_empties_cart() {
    let pool = database_pool().await;
    let user = create_user(&pool, "checkout").await;
    let saree = create_product(&pool, "Banarasi Saree", 500, &[("M", 5), ("L", 2)]).await;
    let kurti = create_product(&pool, "Chanderi Kurti", 200, &[("S", 1)]).await;

    fill_cart(&pool, user.id, &[(&saree, "M", 2), (&kurti, "S", 1)]).await;

    let order = checkout(&pool, user.id).await.expect("checkout");

    assert_eq!(order.subtotal, Amount::new(1200));
    assert_eq!(order.shipping_cost, Amount::ZERO);
    assert_eq!(order.tax, Amount::new(216));
    assert_eq!(order.total, Amount::new(1416));
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.items.len(), 2);

    assert_eq!(stock_of(&pool, saree.product_id, "M").await, 3);
    assert_eq!(stock_of(&pool, saree.product_id, "L").await, 2);
    assert_eq!(stock_of(&pool, kurti.product_id, "S").await, 0);

    let cart = CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .expect("load cart");
    assert!(cart.is_empty());

    let stored = OrderRepository::new(&pool)
        .get(order.order_id)
        .await
        .expect("load order")
        .expect("order persisted");
    assert_eq!(stored.user_id, user.id);
    assert_eq!(stored.total, Amount::new(1416));
    assert_eq!(stored.items, order.items);
    assert_eq!(stored.shipping_address, address());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_small_order_pays_flat_shipping() {
    let pool = database_pool().await;
    let user = create_user(&pool, "shipping").await;
    let kurti = create_product(&pool, "Cotton Kurti", 400, &[("M", 3)]).await;

    fill_cart(&pool, user.id, &[(&kurti, "M", 2)]).await;
    let order = checkout(&pool, user.id).await.expect("checkout");

    assert_eq!(order.subtotal, Amount::new(800));
    assert_eq!(order.shipping_cost, Amount::new(100));
    assert_eq!(order.tax, Amount::new(144));
    assert_eq!(order.total, Amount::new(1044));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_empty_cart_is_rejected() {
    let pool = database_pool().await;
    let user = create_user(&pool, "empty").await;

    let result = checkout(&pool, user.id).await;
    assert!(matches!(
        result,
        Err(PlaceOrderError::Rejected(CheckoutError::EmptyCart))
    ));

    CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .expect("create cart");
    let result = checkout(&pool, user.id).await;
    assert!(matches!(
        result,
        Err(PlaceOrderError::Rejected(CheckoutError::EmptyCart))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_insufficient_stock_changes_nothing() {
    let pool = database_pool().await;
    let user = create_user(&pool, "shortage").await;
    let gown = create_product(&pool, "Silk Gown", 900, &[("M", 5)]).await;
    let saree = create_product(&pool, "Linen Saree", 300, &[("L", 4)]).await;

    fill_cart(&pool, user.id, &[(&saree, "L", 2), (&gown, "M", 3)]).await;

    let patch = ProductPatch {
        stock: Some([("M".to_owned(), 1)].into_iter().collect()),
        ..ProductPatch::default()
    };
    ProductRepository::new(&pool)
        .update(gown.product_id, patch)
        .await
        .expect("restock");

    let result = checkout(&pool, user.id).await;
    assert!(matches!(
        result,
        Err(PlaceOrderError::Rejected(CheckoutError::InsufficientStock { ref size, .. })) if size == "M"
    ));

    assert_eq!(stock_of(&pool, saree.product_id, "L").await, 4);
    assert_eq!(stock_of(&pool, gown.product_id, "M").await, 1);

    let cart = CartRepository::new(&pool)
        .get_or_create(user.id)
        .await
        .expect("load cart");
    assert_eq!(cart.item_count(), 5);
    assert!(
        OrderRepository::new(&pool)
            .list_for_user(user.id)
            .await
            .expect("list orders")
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_buying_the_last_units_leaves_zero() {
    let pool = database_pool().await;
    let user = create_user(&pool, "last-units").await;
    let kurti = create_product(&pool, "Printed Kurti", 250, &[("XL", 2)]).await;

    fill_cart(&pool, user.id, &[(&kurti, "XL", 2)]).await;
    checkout(&pool, user.id).await.expect("checkout");
    assert_eq!(stock_of(&pool, kurti.product_id, "XL").await, 0);

    let buyer = create_user(&pool, "late-buyer").await;
    let carts = CartRepository::new(&pool);
    carts.get_or_create(buyer.id).await.expect("create cart");
    let result = carts
        .modify(buyer.id, |cart| {
            cart.add(&kurti, "XL", 1, Utc::now())?;
            Ok::<_, AppError>(())
        })
        .await;
    assert!(result.is_ok(), "the stale product snapshot still shows stock");

    let result = checkout(&pool, buyer.id).await;
    assert!(matches!(
        result,
        Err(PlaceOrderError::Rejected(CheckoutError::SizeUnavailable { .. }))
    ));
    assert_eq!(stock_of(&pool, kurti.product_id, "XL").await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_price_edit_after_checkout_keeps_taken_stock() {
    let pool = database_pool().await;
    let user = create_user(&pool, "price-edit").await;
    let saree = create_product(&pool, "Kanjivaram Saree", 400, &[("M", 3)]).await;

    fill_cart(&pool, user.id, &[(&saree, "M", 3)]).await;
    checkout(&pool, user.id).await.expect("checkout");
    assert_eq!(stock_of(&pool, saree.product_id, "M").await, 0);

    let patch = ProductPatch {
        price: Some(Amount::new(450)),
        ..ProductPatch::default()
    };
    let updated = ProductRepository::new(&pool)
        .update(saree.product_id, patch)
        .await
        .expect("price edit");

    assert_eq!(updated.price, Amount::new(450));
    assert_eq!(updated.available("M"), 0);
    assert_eq!(stock_of(&pool, saree.product_id, "M").await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_price_edit_and_checkout_never_restore_stock() {
    let pool = database_pool().await;
    let user = create_user(&pool, "race").await;
    let gown = create_product(&pool, "Velvet Gown", 600, &[("S", 3)]).await;

    fill_cart(&pool, user.id, &[(&gown, "S", 3)]).await;

    let edit = async {
        let patch = ProductPatch {
            price: Some(Amount::new(650)),
            ..ProductPatch::default()
        };
        ProductRepository::new(&pool)
            .update(gown.product_id, patch)
            .await
    };
    let (edited, ordered) = tokio::join!(edit, checkout(&pool, user.id));

    edited.expect("price edit");
    ordered.expect("checkout");
    assert_eq!(stock_of(&pool, gown.product_id, "S").await, 0);
}
