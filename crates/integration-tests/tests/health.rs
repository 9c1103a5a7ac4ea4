//! Health checks and response middleware.

use axum::http::StatusCode;
use elegance_integration_tests::{get, test_app};

#[tokio::test]
async fn test_liveness_does_not_touch_database() {
    let app = test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = test_app();
    let response = get(&app, "/health/ready").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json()["status"], "unavailable");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = test_app();

    for uri in ["/health", "/api/cart", "/no-such-route"] {
        let response = get(&app, uri).await;
        assert_eq!(response.header("x-frame-options"), Some("DENY"), "{uri}");
        assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(response.header("cache-control"), Some("no-store"));
        assert_eq!(response.header("referrer-policy"), Some("no-referrer"));
        assert!(
            response
                .header("content-security-policy")
                .is_some_and(|csp| csp.contains("frame-ancestors 'none'"))
        );
    }
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = test_app();
    let response = get(&app, "/health").await;

    let id = response.header("x-request-id").unwrap_or_default();
    assert_eq!(id.len(), 36, "expected a UUID, got {id:?}");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app();
    let response = get(&app, "/api/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
