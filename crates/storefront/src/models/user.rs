//! User domain types.

use chrono::{DateTime, Utc};

use cwish_core::{Email, UserId};

/// A storefront account.
///
/// Accounts are keyed by username; the email is optional and only used to
/// log in with an address instead of a username.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<Email>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
