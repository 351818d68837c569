// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::TokenError;
use crate::store::StoreError;

/// Every failure a handler or pipeline stage can produce.
///
/// Variants other than `Unexpected` are domain errors: they carry their own
/// status. Anything else falls back to 400 Bad Request.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Validation { field: String, message: String },

    // 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 409 Conflict
    #[error("{0}")]
    Conflict(String),

    // 500 Internal Server Error
    #[error("{0}")]
    Internal(String),

    /// Not a recognised domain error.
    #[error("{0}")]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unexpected(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-visible body: always `{ "error": <message> }`.
    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found("User not found"),
            StoreError::DuplicateEmail(email) => {
                ApiError::conflict(format!("A user with email '{}' already exists", email))
            }
            StoreError::IdsExhausted => ApiError::conflict("No user id available"),
            other => ApiError::Unexpected(other.into()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing | TokenError::Invalid(_) => ApiError::unauthorized("Unauthorized"),
            TokenError::Encoding(msg) => {
                tracing::error!("Session token generation failed: {}", msg);
                ApiError::internal("Could not create session")
            }
        }
    }
}

// The one place errors become HTTP responses.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match &self {
            ApiError::Unexpected(err) => tracing::error!(status = status.as_u16(), "{:?}", err),
            _ if status.is_server_error() => tracing::error!(status = status.as_u16(), "{}", self),
            _ => tracing::warn!(status = status.as_u16(), "{}", self),
        }
        (status, Json(self.to_json())).into_response()
    }
}
