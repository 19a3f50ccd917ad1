//! Contact-form submissions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cwish_core::{ContactId, Email};

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated submission, ready to insert.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub message: String,
}
