//! Domain models for storefront.

pub mod session;
pub mod user;

pub use session::{CurrentUser, VerifiedEmail};
pub use user::{Profile, User};
