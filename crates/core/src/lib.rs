//! Cwish Core - Shared domain types.
//!
//! This crate provides the types used across the Cwish components:
//! - `storefront` - JSON API for the catalog, carts, orders and accounts
//! - `site` - Static file server for the marketing frontend
//! - `cli` - Command-line tools for migrations, seeding and the contact inbox
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, emails, and order/print enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
