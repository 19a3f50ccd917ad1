//! Authentication service.
//!
//! Username/password accounts with Argon2id hashes. The session side of
//! logging in lives in [`crate::middleware::auth`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use cwish_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{EMAIL_TAKEN, USERNAME_TAKEN, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// Blank fields count as missing; a blank email is stored as no email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSignupFields` if username or password is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UsernameTaken` / `AuthError::EmailTaken` on duplicates.
    pub async fn signup(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingSignupFields);
        }

        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(Email::parse)
            .transpose()?;

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create_with_password(username, email.as_ref(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(constraint) if constraint == EMAIL_TAKEN => {
                    AuthError::EmailTaken
                }
                RepositoryError::Conflict(constraint) if constraint == USERNAME_TAKEN => {
                    AuthError::UsernameTaken
                }
                other => AuthError::Repository(other),
            })
    }

    /// Log in with a username or an email address.
    ///
    /// The identifier is looked up as a username first, then as an email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either value is blank.
    /// Returns `AuthError::InvalidCredentials` if no account matches or the
    /// password is wrong.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let mut found = self.users.get_password_hash_by_username(identifier).await?;
        if found.is_none() {
            if let Ok(email) = Email::parse(identifier) {
                found = self.users.get_password_hash_by_email(&email).await?;
            }
        }

        let (user, password_hash) = found.ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_id(user_id).await?)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("hunter22").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_counts_characters() {
        // 7 characters, 14 bytes
        assert!(validate_password("ééééééé").is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("correct horse").unwrap();
        let b = hash_password("correct horse").unwrap();
        assert_ne!(a, b);
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cwish_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_blank_fields_rejected_before_lookup() {
        let pool = lazy_pool();
        let auth = AuthService::new(&pool);

        assert!(matches!(
            auth.login("  ", "password").await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.login("ada", "").await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.signup("", None, "password123").await,
            Err(AuthError::MissingSignupFields)
        ));
        assert!(matches!(
            auth.signup("ada", Some("not-an-email"), "password123").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.signup("ada", None, "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
