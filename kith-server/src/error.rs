//! API error surface.
//!
//! Every error the server returns goes through [`ApiError`], which maps to
//! an HTTP status plus a machine-readable code in a JSON body. The codes
//! (`no_vault_access`, `insufficient_permissions`, `two_factor_required`)
//! are part of the external contract. Internal error details are logged
//! but never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kith_core::CalendarError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. "no_vault_access".
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token (401).
    #[error("authentication required")]
    Unauthorized,

    /// No grant row for this user on this vault (403).
    #[error("no access to this vault")]
    NoVaultAccess,

    /// A grant exists but its tier is too weak for the operation (403).
    #[error("insufficient permissions for this operation")]
    InsufficientPermission,

    /// The token has not completed two-factor verification (403).
    #[error("two-factor verification required")]
    TwoFactorPending,

    /// Resource not found, or not scoped to the authorised vault (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request content failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::NoVaultAccess => (StatusCode::FORBIDDEN, "no_vault_access"),
            Self::InsufficientPermission => (StatusCode::FORBIDDEN, "insufficient_permissions"),
            Self::TwoFactorPending => (StatusCode::FORBIDDEN, "two_factor_required"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::UnsupportedCalendar(_) | CalendarError::InvalidDate(_) => {
                Self::Validation(err.to_string())
            }
            // Exhausted recurrence scans indicate corrupt data or a table
            // bug, not a client mistake.
            CalendarError::NoRecurrenceFound => Self::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}
