//! Request extractors.

use std::borrow::Cow;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use cwish_core::Email;

use crate::error::{AppError, FieldErrors};

/// JSON body whose rejections answer `400 {"error": ...}`.
///
/// Use instead of `axum::Json` for request bodies; axum's own rejections are
/// plain text and some are `422`.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        axum::Json::<T>::from_request(req, state)
            .await
            .map(|axum::Json(value)| Self(value))
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// Path parameters; a segment that does not parse is `404 {"error": "Not found."}`.
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(_)) => {
                Err(AppError::NotFound("Not found.".to_string()))
            }
            Err(rejection) => Err(AppError::Internal(rejection.body_text())),
        }
    }
}

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON is a `400 {"error": ...}`; rule violations are a
/// `400 {"errors": {field: [messages]}}`.
///
/// ```rust,ignore
/// async fn submit(ValidatedJson(body): ValidatedJson<ContactRequest>) -> Result<Json<Contact>> {
///     // body passed validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;

        value
            .validate()
            .map_err(|errors| AppError::Validation(field_errors(&errors)))?;

        Ok(Self(value))
    }
}

/// Flatten `validator` errors into field → messages.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut result = FieldErrors::new();
    for (field, errors) in errors.field_errors() {
        let messages = errors
            .iter()
            .map(|error| {
                error.message.as_ref().map_or_else(
                    || format!("Invalid value for field '{field}'."),
                    ToString::to_string,
                )
            })
            .collect();
        result.insert(field.to_string(), messages);
    }
    result
}

/// `validator` rule rejecting empty and whitespace-only strings.
///
/// # Errors
///
/// Returns a `blank` validation error when `value` has no visible characters.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("This field may not be blank."));
        return Err(error);
    }
    Ok(())
}

/// `validator` rule accepting what [`Email::parse`] accepts.
///
/// # Errors
///
/// Returns an `email` validation error for malformed addresses.
pub fn valid_email(value: &str) -> Result<(), ValidationError> {
    Email::parse(value).map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("email");
        error.message = Some(Cow::Borrowed("Enter a valid email address."));
        error
    })
}

/// Parse an already-validated email field into the domain type.
///
/// # Errors
///
/// Returns `AppError::Validation` keyed by `field` if the address is rejected.
pub fn email_field(field: &str, raw: &str) -> Result<Email, AppError> {
    Email::parse(raw).map_err(|_| {
        let mut errors = FieldErrors::new();
        errors.insert(
            field.to_string(),
            vec!["Enter a valid email address.".to_string()],
        );
        AppError::Validation(errors)
    })
}

/// Trim an optional field, treating blank as absent.
#[must_use]
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        name: String,
        #[validate(email(message = "Enter a valid email address."))]
        email: String,
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_payload_passes() {
        let req = json_request(r#"{"name":"Ada","email":"ada@example.com"}"#);
        let ValidatedJson(payload) = ValidatedJson::<Payload>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(payload.name, "Ada");
    }

    #[tokio::test]
    async fn test_rule_violations_collected_per_field() {
        let req = json_request(r#"{"name":"","email":"nope"}"#);
        let Err(AppError::Validation(errors)) =
            ValidatedJson::<Payload>::from_request(req, &()).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors["name"], vec!["This field may not be blank."]);
        assert_eq!(errors["email"], vec!["Enter a valid email address."]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = json_request("{not json");
        let Err(err) = ValidatedJson::<Payload>::from_request(req, &()).await else {
            panic!("expected rejection");
        };
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_json_types_are_bad_request() {
        let req = json_request(r#"{"name": 5, "email": "ada@example.com"}"#);
        let Err(err) = JsonBody::<Payload>::from_request(req, &()).await else {
            panic!("expected rejection");
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();
        let Err(err) = JsonBody::<Payload>::from_request(req, &()).await else {
            panic!("expected rejection");
        };
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_non_blank_rejects_whitespace() {
        assert!(non_blank("Ada").is_ok());
        let error = non_blank("   ").unwrap_err();
        assert_eq!(error.code, "blank");
    }

    #[test]
    fn test_valid_email_matches_domain_type() {
        assert!(valid_email("ada@example.com").is_ok());
        assert!(valid_email("ada@localhost").is_err());
        assert!(valid_email("a b@example.com").is_err());
    }

    #[test]
    fn test_email_field_error_is_keyed() {
        assert_eq!(
            email_field("email", "ada@example.com").unwrap().as_str(),
            "ada@example.com"
        );
        let Err(AppError::Validation(errors)) = email_field("email", "ada@") else {
            panic!("expected validation error");
        };
        assert_eq!(errors["email"], vec!["Enter a valid email address."]);
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  +1 555  ".to_string())).as_deref(), Some("+1 555"));
        assert_eq!(optional_text(Some("   ".to_string())), None);
        assert_eq!(optional_text(None), None);
    }
}
