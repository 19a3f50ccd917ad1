//! Cwish storefront library.
//!
//! The JSON API behind the Cwish marketing site: catalog, carts, orders,
//! accounts and the contact form. Exposed as a library so the CLI and the
//! tests can reuse its repositories and router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
