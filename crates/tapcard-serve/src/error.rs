//! API error types and response formatting.
//!
//! [`ApiError`] renders as JSON for `/api/...` routes. Card pages wrap it in
//! [`PageError`], which renders the same status as a small HTML page.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, PreEscaped, html};
use serde::Serialize;
use tapcard_core::render::components::ERROR_CSS;
use tapcard_core::{EncodingError, StoreError, ValidationError};

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A submitted profile field was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No card under this identifier.
    #[error("card not found: {0}")]
    NotFound(String),

    /// The card's URL does not fit a QR symbol or NFC tag.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Malformed form data or an unsupported upload.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An uploaded image exceeded the configured limit.
    #[error("upload exceeds {limit} bytes")]
    PayloadTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The card store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal server error (I/O, task failures, etc.).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<tapcard_core::Error> for ApiError {
    fn from(err: tapcard_core::Error) -> Self {
        match err {
            tapcard_core::Error::Validation(e) => Self::Validation(e),
            tapcard_core::Error::NotFound { card_id } => Self::NotFound(card_id),
            tapcard_core::Error::Encoding(e) => Self::Encoding(e),
            tapcard_core::Error::Store(e) => Self::Store(e),
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Encoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log server-side failures. Their details never reach the client.
    fn log_internal(&self) {
        match self {
            Self::Store(err) => tracing::error!(error = %err, "card store error"),
            Self::Internal(err) => tracing::error!(error = %err, "internal server error"),
            _ => {}
        }
    }

    /// Error code and client-facing message.
    fn describe(&self) -> (&'static str, String) {
        match self {
            Self::Validation(e) => ("validation_failed", e.to_string()),
            Self::NotFound(_) => ("not_found", self.to_string()),
            Self::Encoding(e) => ("encoding_failed", e.to_string()),
            Self::BadRequest(msg) => ("bad_request", msg.clone()),
            Self::PayloadTooLarge { .. } => ("payload_too_large", self.to_string()),
            Self::Store(_) => ("store_error", "A storage error occurred".to_string()),
            Self::Internal(_) => ("internal_error", "An internal error occurred".to_string()),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status();
        let (error, message) = self.describe();
        let field = match &self {
            Self::Validation(e) => Some(e.field),
            _ => None,
        };

        (status, Json(ErrorResponse { error, field, message })).into_response()
    }
}

/// An [`ApiError`] rendered as an HTML page, for browser-facing routes.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<tapcard_core::Error> for PageError {
    fn from(err: tapcard_core::Error) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log_internal();
        let status = self.0.status();
        let (title, message) = match &self.0 {
            ApiError::NotFound(_) => (
                "Card Not Found",
                "This card does not exist or has been removed.".to_string(),
            ),
            ApiError::Encoding(_) => (
                "Cannot Encode Card",
                "This card's address is too long for a QR code.".to_string(),
            ),
            _ => (
                "Something Went Wrong",
                "An internal error occurred. Please try again later.".to_string(),
            ),
        };

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) }
                    meta name="robots" content="noindex";
                    style { (PreEscaped(ERROR_CSS)) }
                }
                body {
                    main class="error-page" {
                        h1 { (title) }
                        p { (message) }
                    }
                }
            }
        };

        (status, markup).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn validation() -> ApiError {
        tapcard_core::validate(&[("name".to_string(), "Ada".to_string())].into())
            .unwrap_err()
            .into()
    }

    #[test]
    fn error_display_not_found() {
        let err = ApiError::NotFound("abc".to_string());
        assert_eq!(err.to_string(), "card not found: abc");
    }

    #[test]
    fn core_errors_map_to_api_errors() {
        let err: ApiError = tapcard_core::Error::NotFound {
            card_id: "abc".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(ref id) if id == "abc"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validation_error_body_names_field() {
        let response = validation().into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "email");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = ApiError::Internal(anyhow::anyhow!("secret path /etc")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("/etc"));
        assert!(body.get("field").is_none());
    }

    #[test]
    fn upload_errors_status() {
        assert_eq!(
            ApiError::BadRequest("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn page_error_renders_html() {
        let response = PageError(ApiError::NotFound("abc".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<h1>Card Not Found</h1>"));
    }
}
