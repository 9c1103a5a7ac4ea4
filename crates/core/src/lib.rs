//! Elegance Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Elegance components:
//! - `storefront` - JSON API server (shop and admin endpoints)
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything the checkout flow decides (stock validation,
//! totals, decrements) is computed here so it can be tested without Postgres.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money and statuses
//! - [`catalog`] - Products and per-size stock
//! - [`cart`] - Cart line items and merge rules
//! - [`wishlist`] - Saved products
//! - [`address`] - Address book with default-address rules
//! - [`order`] - Orders, shipping addresses and status updates
//! - [`pricing`] - Shipping and tax policy
//! - [`checkout`] - Validation and planning of a checkout
//! - [`stats`] - Admin dashboard aggregation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod pricing;
pub mod stats;
pub mod types;
pub mod wishlist;

pub use types::*;
