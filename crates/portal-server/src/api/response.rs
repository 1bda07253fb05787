//! API response types
//!
//! Success bodies are `{ "success": true, "data": ... }`; failures are
//! `{ "success": false, "error": { "code", "message", "details"? } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::credentials::CredentialError;
use crate::db::StoreError;
use crate::ingest::IngestError;
use crate::storage::BlobError;

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new success response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    /// Create a success response with metadata
    pub fn success_with_meta(data: T, meta: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Plain `{ "message": ... }` payload for operations with nothing to return
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an error response with details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

/// Application error type that can be converted to HTTP responses
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Upload is not a readable CSV
    Format(String),
    /// Upload lacks required columns
    Schema(Vec<String>),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    ValidationError(String),
    /// Reset token unknown or already used
    InvalidToken(String),
    /// Blob store, record store or notifier failed
    Dependency(String),
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("BAD_REQUEST", msg))
            },
            AppError::Format(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("FORMAT_ERROR", msg))
            },
            AppError::Schema(missing) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "SCHEMA_ERROR",
                    format!("CSV is missing required columns: {}", missing.join(", ")),
                    json!({ "missing": missing }),
                ),
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorResponse::new("UNAUTHORIZED", msg))
            },
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse::new("FORBIDDEN", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new("CONFLICT", msg)),
            AppError::ValidationError(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("VALIDATION_ERROR", msg),
            ),
            AppError::InvalidToken(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("INVALID_TOKEN", msg))
            },
            AppError::Dependency(msg) => {
                tracing::error!("Dependency error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::new("DEPENDENCY_ERROR", "A backing service failed"),
                )
            },
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                )
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Dependency(err.to_string())
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        AppError::Dependency(err.to_string())
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Format(msg) => AppError::Format(msg),
            IngestError::Schema { missing } => AppError::Schema(missing),
            e @ IngestError::Validation { .. } => AppError::ValidationError(e.to_string()),
            IngestError::Archive(e) => e.into(),
            IngestError::Store(e) => e.into(),
            IngestError::Credentials(e) => e.into(),
        }
    }
}

/// Alias for Result with AppError
pub type ApiResult<T> = Result<T, AppError>;
