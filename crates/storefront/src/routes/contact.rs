//! Contact form route handler.
//!
//! Submissions are stored for the team to triage with `cwish-cli contacts`.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use cwish_core::ContactId;

use crate::db::ContactRepository;
use crate::error::Result;
use crate::extract::{ValidatedJson, email_field, non_blank, optional_text, valid_email};
use crate::models::NewContact;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub message: String,
}

/// Response for a stored submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: String,
    pub contact_id: ContactId,
}

/// Submit the contact form.
///
/// POST /api/contact
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    let contact = NewContact {
        name: form.name.trim().to_string(),
        email: email_field("email", &form.email)?,
        phone: optional_text(form.phone),
        message: form.message.trim().to_string(),
    };

    let contact = ContactRepository::new(state.pool()).create(&contact).await?;
    tracing::info!(contact_id = %contact.id, "Contact form submitted");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            message: "Thank you for your message! We will get back to you soon.".to_string(),
            contact_id: contact.id,
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{json_body, json_request, send};

    #[tokio::test]
    async fn test_invalid_submission_lists_field_errors() {
        let response = send(json_request(
            "POST",
            "/api/contact/",
            r#"{"name": "", "email": "not-an-email", "message": "  "}"#,
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["name"][0], "This field may not be blank.");
        assert_eq!(body["errors"]["email"][0], "Enter a valid email address.");
        assert_eq!(body["errors"]["message"][0], "This field may not be blank.");
        assert!(body["errors"].get("phone").is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = send(json_request("POST", "/api/contact/", "{")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_overlong_phone_rejected() {
        let response = send(json_request(
            "POST",
            "/api/contact/",
            r#"{"name": "Ada", "email": "ada@example.com", "phone": "123456789012345678901", "message": "Hi"}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["errors"]["phone"][0],
            "Ensure this field has no more than 20 characters."
        );
    }
}
