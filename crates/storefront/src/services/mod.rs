//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Passcode and password authentication
//! - `email` - Passcode delivery over SMTP

pub mod auth;
pub mod email;

pub use auth::{AuthError, AuthService, IssuedOtp};
pub use email::{EmailError, EmailService};
