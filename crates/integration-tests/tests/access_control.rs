//! Endpoints that need a signed-in user or an admin reject anonymous
//! requests before doing any work.

use axum::http::{Method, StatusCode};
use serde_json::json;

use elegance_integration_tests::{TestResponse, get, send, test_app};

fn assert_unauthorized(response: &TestResponse, what: &str) {
    assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{what}");
    assert_eq!(response.json()["error"], "Unauthorized", "{what}");
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = test_app();

    assert_unauthorized(&get(&app, "/api/cart").await, "GET /api/cart");

    let body = json!({ "productId": "5f0c6a4e-6a8e-4b53-9d0c-0d3c8f1f2a11", "size": "M" });
    let response = send(&app, Method::POST, "/api/cart", Some(body)).await;
    assert_unauthorized(&response, "POST /api/cart");
}

#[tokio::test]
async fn test_wishlist_requires_login() {
    let app = test_app();
    assert_unauthorized(&get(&app, "/api/wishlist").await, "GET /api/wishlist");
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let app = test_app();
    let body = json!({
        "shippingAddress": {
            "name": "Asha Rao",
            "phone": "9876543210",
            "street": "12 MG Road",
            "city": "Pune",
            "state": "MH",
            "postalCode": "411001",
            "country": "India"
        },
        "paymentMethod": "cod"
    });

    let response = send(&app, Method::POST, "/api/checkout", Some(body)).await;
    assert_unauthorized(&response, "POST /api/checkout");
}

#[tokio::test]
async fn test_account_routes_require_login() {
    let app = test_app();

    for uri in ["/api/user/profile", "/api/user/addresses", "/api/user/orders"] {
        assert_unauthorized(&get(&app, uri).await, uri);
    }
}

#[tokio::test]
async fn test_admin_routes_require_login() {
    let app = test_app();

    for uri in ["/api/admin/stats", "/api/admin/orders", "/api/admin/products"] {
        assert_unauthorized(&get(&app, uri).await, uri);
    }

    let response = send(
        &app,
        Method::DELETE,
        "/api/admin/products/5f0c6a4e-6a8e-4b53-9d0c-0d3c8f1f2a11",
        None,
    )
    .await;
    assert_unauthorized(&response, "DELETE /api/admin/products/{id}");
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let app = test_app();
    let response = send(&app, Method::POST, "/api/auth/logout", None).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
}
