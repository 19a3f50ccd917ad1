//! Authentication route handlers.
//!
//! Session-cookie accounts: signup and login store a [`CurrentUser`] in the
//! session (rotating its id), logout flushes it.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::JsonBody;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Signup body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// Login body: either `username` or `email` identifies the account.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// The username if given, otherwise the email.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
    }
}

async fn log_in(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.id, &user.username);
    Ok(())
}

/// Create an account and log in.
///
/// POST /api/auth/signup
#[instrument(skip(state, session, body), fields(username = %body.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let user = AuthService::new(state.pool())
        .signup(&body.username, body.email.as_deref(), &body.password)
        .await?;

    let current = CurrentUser::from(&user);
    log_in(&session, &current).await?;
    tracing::info!(user_id = %user.id, "Account created");

    Ok((StatusCode::CREATED, Json(current)))
}

/// Log in by username or email.
///
/// POST /api/auth/login
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.pool())
        .login(body.identifier(), &body.password)
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "Login failed"))?;

    let current = CurrentUser::from(&user);
    log_in(&session, &current).await?;
    tracing::info!(user_id = %user.id, "Logged in");

    Ok(Json(current))
}

/// Log out.
///
/// POST /api/auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "ok": true, "message": "Successfully logged out" })))
}

/// The logged-in user, or `{"id": null}`.
///
/// GET /api/auth/me
///
/// A session whose account no longer exists is treated as anonymous.
#[instrument(skip(state, user))]
pub async fn me(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> Result<Json<Value>> {
    let Some(user) = user else {
        return Ok(Json(json!({ "id": null })));
    };

    match AuthService::new(state.pool()).get_user(user.id).await? {
        Some(account) => Ok(Json(json!(CurrentUser::from(&account)))),
        None => Ok(Json(json!({ "id": null }))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::routes::test_support::{get, json_body, json_request, send};

    fn login(body: &str) -> LoginRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_identifier_prefers_username() {
        assert_eq!(
            login(r#"{"username": "ada", "email": "ada@example.com", "password": "x"}"#)
                .identifier(),
            "ada"
        );
        assert_eq!(
            login(r#"{"username": " ", "email": "ada@example.com", "password": "x"}"#)
                .identifier(),
            "ada@example.com"
        );
        assert_eq!(login(r#"{"password": "x"}"#).identifier(), "");
    }

    #[tokio::test]
    async fn test_me_without_session_is_anonymous() {
        let response = send(get("/api/auth/me/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "id": null }));
    }

    #[tokio::test]
    async fn test_login_missing_credentials() {
        let response = send(json_request("POST", "/api/auth/login/", r#"{"username": "ada"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing credentials");
    }

    #[tokio::test]
    async fn test_login_wrong_types_answer_json() {
        for body in [r#"{"username": 5, "password": "x"}"#, "{not json"] {
            let response = send(json_request("POST", "/api/auth/login/", body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert!(json_body(response).await["error"].is_string(), "{body}");
        }
    }

    #[tokio::test]
    async fn test_signup_missing_fields() {
        let response = send(json_request("POST", "/api/auth/signup/", r#"{"username": ""}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "username and password are required"
        );
    }

    #[tokio::test]
    async fn test_signup_short_password() {
        let response = send(json_request(
            "POST",
            "/api/auth/signup/",
            r#"{"username": "ada", "password": "short"}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "password must be at least 8 characters"
        );
    }

    #[tokio::test]
    async fn test_signup_invalid_email() {
        let response = send(json_request(
            "POST",
            "/api/auth/signup/",
            r#"{"username": "ada", "email": "ada@", "password": "correct horse"}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Enter a valid email address.");
    }
}
