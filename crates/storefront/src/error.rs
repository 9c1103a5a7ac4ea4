//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error response has the body `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use elegance_core::address::AddressError;
use elegance_core::cart::CartError;
use elegance_core::catalog::CatalogError;
use elegance_core::checkout::CheckoutError;
use elegance_core::wishlist::WishlistError;

use crate::db::RepositoryError;
use crate::db::checkout::PlaceOrderError;
use crate::db::products::UpdateProductError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Wishlist(#[from] WishlistError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// User is authenticated but lacks the required role.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with existing state.
    #[error("{0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Too many requests")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PlaceOrderError> for AppError {
    fn from(err: PlaceOrderError) -> Self {
        match err {
            PlaceOrderError::Rejected(e) => Self::Checkout(e),
            PlaceOrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<UpdateProductError> for AppError {
    fn from(err: UpdateProductError) -> Self {
        match err {
            UpdateProductError::Invalid(e) => Self::Catalog(e),
            UpdateProductError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    /// HTTP status and client-facing message.
    ///
    /// Internal error details are never exposed.
    fn status_and_message(&self) -> (StatusCode, String) {
        const INTERNAL: &str = "Internal server error";

        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
                RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned())
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                AuthError::AccountExists => (StatusCode::CONFLICT, err.to_string()),
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_owned())
                }
                AuthError::InvalidOtp | AuthError::EmailNotVerified | AuthError::WeakPassword(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                AuthError::Delivery(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned())
                }
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::LineNotFound => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                _ => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::Address(err) => match err {
                AddressError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                AddressError::MissingField(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::Checkout(err) => match err {
                CheckoutError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                _ => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::Catalog(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Wishlist(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            Self::Session(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("Product not found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CartError::LineNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AuthError::AccountExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(PlaceOrderError::Rejected(CheckoutError::MissingDetails).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (status, message) =
            AppError::Internal("connection reset".to_string()).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");

        let (_, message) =
            AppError::Database(RepositoryError::DataCorruption("bad row".to_string()))
                .status_and_message();
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_checkout_messages_pass_through() {
        let (_, message) = AppError::from(CheckoutError::EmptyCart).status_and_message();
        assert_eq!(message, "Cart is empty");
    }
}
