//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Username/password accounts
//! - `catalog` - Cached active-product lookups
//! - `checkout` - Order placement from carts
//! - `shirtigo` - Print-on-demand fulfillment client
//! - `email` - Order confirmation email

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod shirtigo;
