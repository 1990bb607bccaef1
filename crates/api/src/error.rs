//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. All route handlers return `Result<T, AppError>`; the
//! client always receives a JSON body `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::newsletter::NewsletterError;
use crate::services::orders::OrderError;
use crate::services::qr_codes::QrCodeError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("QR code error: {0}")]
    QrCode(#[from] QrCodeError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Newsletter error: {0}")]
    Newsletter(#[from] NewsletterError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing message. `None` marks errors whose
    /// details must not reach the client.
    fn classify(&self) -> (StatusCode, Option<String>) {
        match self {
            Self::Database(_) | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, Some("Invalid credentials".to_owned()))
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    Some("An account with this email already exists".to_owned()),
                ),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, Some("Invalid email address".to_owned()))
                }
                AuthError::InvalidName { .. } => (StatusCode::BAD_REQUEST, Some(err.to_string())),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, None)
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity | CartError::InvalidProductType => {
                    (StatusCode::BAD_REQUEST, Some(err.to_string()))
                }
                CartError::QrCodeNotFound => (StatusCode::NOT_FOUND, Some(err.to_string())),
                CartError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            },
            Self::QrCode(err) => match err {
                QrCodeError::InvalidName | QrCodeError::InvalidDestination => {
                    (StatusCode::BAD_REQUEST, Some(err.to_string()))
                }
                QrCodeError::QuotaExceeded { .. } => (StatusCode::FORBIDDEN, Some(err.to_string())),
                QrCodeError::UserNotFound => {
                    (StatusCode::UNAUTHORIZED, Some("Not authenticated".to_owned()))
                }
                QrCodeError::ShortCodeExhausted
                | QrCodeError::ShortCode(_)
                | QrCodeError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            },
            Self::Order(err) => match err {
                OrderError::EmptyCart | OrderError::TooManyItems => {
                    (StatusCode::BAD_REQUEST, Some(err.to_string()))
                }
                OrderError::NotFound(_) => (StatusCode::NOT_FOUND, Some(err.to_string())),
                OrderError::OrderNumberExhausted | OrderError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, None)
                }
            },
            Self::Newsletter(err) => match err {
                NewsletterError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, Some("Invalid email address".to_owned()))
                }
                NewsletterError::NameTooLong => (StatusCode::BAD_REQUEST, Some(err.to_string())),
                NewsletterError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            },
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => {
                let status = match self {
                    Self::NotFound(_) => StatusCode::NOT_FOUND,
                    Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, Some(msg.clone()))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = message.unwrap_or_else(|| INTERNAL_MESSAGE.to_owned());
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_and_body(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("x".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::BadRequest("x".to_owned()), StatusCode::BAD_REQUEST),
            (
                AppError::QrCode(QrCodeError::QuotaExceeded { limit: 5 }),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::Auth(AuthError::UserAlreadyExists),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Cart(CartError::InvalidQuantity),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Order(OrderError::EmptyCart),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Order(OrderError::TooManyItems),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Database(RepositoryError::NotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(status_and_body(err).await.0, expected);
        }
    }

    #[tokio::test]
    async fn test_body_is_json_error() {
        let (_, body) = status_and_body(AppError::NotFound("QR code not found".to_owned())).await;
        assert_eq!(body, json!({ "error": "QR code not found" }));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = status_and_body(AppError::Database(RepositoryError::DataCorruption(
            "bad row".to_owned(),
        )))
        .await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
