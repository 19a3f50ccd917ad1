//! Contact inbox repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use cwish_core::{ContactId, Email};

use super::RepositoryError;
use crate::models::{Contact, NewContact};

#[derive(FromRow)]
struct ContactRow {
    id: ContactId,
    name: String,
    email: String,
    phone: Option<String>,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = RepositoryError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            phone: row.phone,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, contact: &NewContact) -> Result<Contact, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r"
            INSERT INTO store.contact (name, email, phone, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, message, is_read, created_at
            ",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(contact.phone.as_deref())
        .bind(&contact.message)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Submissions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, unread_only: bool) -> Result<Vec<Contact>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r"
            SELECT id, name, email, phone, message, is_read, created_at
            FROM store.contact
            WHERE NOT ($1 AND is_read)
            ORDER BY created_at DESC
            ",
        )
        .bind(unread_only)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Flag a submission as handled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no submission has that id.
    pub async fn mark_read(&self, id: ContactId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE store.contact SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
