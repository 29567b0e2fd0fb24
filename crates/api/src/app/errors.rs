use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use recipebook_auth::{AuthFailure, DenyReason, PasswordError, TokenIssueError};
use recipebook_core::StorageError;
use recipebook_validation::{FieldError, UniquenessError, ValidationError, ValidationFailure};

/// Every way a request can be rejected, in transport-neutral terms.
///
/// The guard and handlers produce these; [`IntoResponse`] is the only place
/// they become status codes.
#[derive(Debug, Error)]
pub enum ApiFailure {
    #[error("{0}")]
    Authentication(AuthFailure),

    #[error("{0}")]
    Authorization(DenyReason),

    #[error("{}", .0.message())]
    Validation(ValidationFailure),

    #[error("{0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Backend(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "unauthenticated",
            Self::Authorization(_) => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Backend(_) => "internal_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<AuthFailure> for ApiFailure {
    fn from(err: AuthFailure) -> Self {
        match err {
            AuthFailure::BackendUnavailable => Self::Backend(err.to_string()),
            other => Self::Authentication(other),
        }
    }
}

impl From<StorageError> for ApiFailure {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            StorageError::Conflict(msg) => Self::Conflict(msg),
            StorageError::BackendUnavailable(msg) => {
                tracing::warn!(error = %msg, "storage unavailable");
                Self::Backend("storage unavailable".to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiFailure {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Invalid(failure) => Self::Validation(failure),
            ValidationError::UnknownKind(kind) => {
                tracing::error!(%kind, "no schema for payload kind");
                Self::Backend(format!("no schema registered for payload kind {kind}"))
            }
        }
    }
}

impl From<UniquenessError> for ApiFailure {
    fn from(err: UniquenessError) -> Self {
        match err {
            UniquenessError::Backend(e) => e.into(),
            taken => Self::Conflict(taken.to_string()),
        }
    }
}

impl From<PasswordError> for ApiFailure {
    fn from(err: PasswordError) -> Self {
        tracing::warn!(error = %err, "password hashing failed");
        Self::Backend("password hashing failed".to_string())
    }
}

impl From<TokenIssueError> for ApiFailure {
    fn from(err: TokenIssueError) -> Self {
        tracing::warn!(error = %err, "token issuing failed");
        Self::Backend("token issuing failed".to_string())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        match self {
            Self::Validation(failure) => json_error_with_details(status, code, failure.message(), &failure.details),
            Self::Backend(_) => json_error(status, code, "internal error"),
            other => json_error(status, code, other.to_string()),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn json_error_with_details(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    details: &[FieldError],
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "details": details,
        })),
    )
        .into_response()
}
