use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::reconcile::FieldErrors;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `UNPROCESSABLE`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`,
    /// `CONFLICT`, `EMAIL_TAKEN`, `PAYLOAD_TOO_LARGE`, `INTERNAL_ERROR`.
    #[schema(example = "UNPROCESSABLE")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Validation failed")]
    pub message: String,
    /// Per-field messages for `UNPROCESSABLE` responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = json!({"capacity": "Capacity must be an integer greater than 0"}))]
    pub errors: Option<BTreeMap<String, String>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input (400).
    Validation(String),
    /// Field-level constraint violations (422).
    Unprocessable {
        message: String,
        errors: FieldErrors,
    },
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    PayloadTooLarge(String),
    Internal(String),
}

impl AppError {
    /// 422 with per-field messages.
    pub fn invalid_fields(errors: FieldErrors) -> Self {
        AppError::Unprocessable {
            message: "Validation failed".into(),
            errors,
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, errors) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::Unprocessable { message, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE",
                message,
                Some(errors.into_map()),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "Email already exists".into(),
                None,
            ),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg, None)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };

        (
            status,
            ErrorBody {
                success: false,
                code,
                message,
                errors,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::PayloadTooLarge(format!("File too large. Maximum size is {limit} bytes"))
            }
            StorageError::InvalidExtension(ext) => {
                AppError::Validation(format!("Unsupported file extension: {ext}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
