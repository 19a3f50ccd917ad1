//! Domain models for the storefront.
//!
//! These types represent validated domain objects, separate from the
//! database row types in [`crate::db`].

pub mod cart;
pub mod contact;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY};
pub use contact::{Contact, NewContact};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderLineProduct, ShippingDetails,
};
pub use product::{BonusProduct, CatalogProduct, Product};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
