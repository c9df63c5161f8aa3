//! Unified Error Handling
//!
//! Provides application-wide error types and response structures:
//! - [`AppError`] - application error enum
//! - [`AppResponse`] - API response structure
//!
//! # Error Code Table
//!
//! | Code | Status | Meaning |
//! |-------|--------|---------|
//! | E0000 | 200 | Success |
//! | E0002 | 400 | Validation failed |
//! | E0003 | 404 | Resource not found |
//! | E0005 | 422 | Amount mismatch (flagged for review) |
//! | E1001 | 401 | Webhook signature invalid |
//! | E1002 | 401 | Webhook token invalid |
//! | E9001 | 500 | Internal error |
//! | E9002 | 500 | Store error (provider should retry) |
//! | E9003 | 503 | Concurrent update conflict (provider should retry) |
//!
//! Signature failures are deliberately client errors: a provider retry loop
//! must not hammer an endpoint that will never accept the payload. Store
//! failures are server errors so the provider's retry logic redelivers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Unified API response structure
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Webhook Authentication Errors ==========
    #[error("Invalid signature")]
    SignatureInvalid,

    #[error("Invalid webhook token")]
    TokenInvalid,

    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Amount mismatch: {0}")]
    AmountMismatch(String),

    // ========== System Errors ==========
    #[error("Store error: {0}")]
    Store(String),

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Webhook authentication (401) - provider must not keep retrying
            AppError::SignatureInvalid => {
                (StatusCode::UNAUTHORIZED, "E1001", "Invalid signature".to_string())
            }
            AppError::TokenInvalid => {
                (StatusCode::UNAUTHORIZED, "E1002", "Invalid webhook token".to_string())
            }

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),

            // Amount mismatch (422) - never paid, flagged for manual review
            AppError::AmountMismatch(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E0005", msg.clone())
            }

            // Store errors (500) - provider retries by redelivering
            AppError::Store(msg) => {
                error!(target: "store", error = %msg, "Store error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Store error".to_string(),
                )
            }

            // Concurrent update (503) - safe to redeliver, idempotency absorbs it
            AppError::Conflict(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "E9003", msg.clone())
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
