//! Contact inbox triage.
//!
//! # Usage
//!
//! ```bash
//! cwish-cli contacts list --unread
//! cwish-cli contacts mark-read 42
//! ```

use cwish_core::ContactId;
use cwish_storefront::db::{ContactRepository, RepositoryError};
use cwish_storefront::models::Contact;

use super::{CommandError, connect};

/// One-line summary of a submission.
fn summary(contact: &Contact) -> String {
    let marker = if contact.is_read { ' ' } else { '*' };
    let first_line = contact.message.lines().next().unwrap_or_default();
    format!(
        "{marker} #{id} {date} {name} <{email}>{phone}: {first_line}",
        id = contact.id,
        date = contact.created_at.format("%Y-%m-%d %H:%M"),
        name = contact.name,
        email = contact.email,
        phone = contact
            .phone
            .as_deref()
            .map(|p| format!(" ({p})"))
            .unwrap_or_default(),
    )
}

/// Print submissions, newest first.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the query fails.
pub async fn list(unread_only: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let contacts = ContactRepository::new(&pool).list(unread_only).await?;

    #[allow(clippy::print_stdout)]
    {
        if contacts.is_empty() {
            println!("No messages.");
        }
        for contact in &contacts {
            println!("{}", summary(contact));
        }
    }
    Ok(())
}

/// Mark a submission as read.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if no submission has that id.
pub async fn mark_read(id: i32) -> Result<(), CommandError> {
    let pool = connect().await?;
    match ContactRepository::new(&pool)
        .mark_read(ContactId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(contact_id = id, "Marked as read");
            Ok(())
        }
        Err(RepositoryError::NotFound) => {
            Err(CommandError::Invalid(format!("no contact with id {id}")))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use cwish_core::Email;

    use super::*;

    fn contact(is_read: bool, phone: Option<&str>) -> Contact {
        Contact {
            id: ContactId::new(42),
            name: "Ada Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: phone.map(ToString::to_string),
            message: "Do you ship to Canada?\nThanks!".to_string(),
            is_read,
            created_at: Utc.with_ymd_and_hms(2025, 10, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_unread_summary() {
        assert_eq!(
            summary(&contact(false, Some("+1 555 0100"))),
            "* #42 2025-10-01 09:30 Ada Lovelace <ada@example.com> (+1 555 0100): Do you ship to Canada?"
        );
    }

    #[test]
    fn test_read_summary_without_phone() {
        assert_eq!(
            summary(&contact(true, None)),
            "  #42 2025-10-01 09:30 Ada Lovelace <ada@example.com>: Do you ship to Canada?"
        );
    }
}
