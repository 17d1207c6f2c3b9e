//! Error types for the Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error kinds exposed in API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UserNotFound,
    AlreadyOwned,
    IdMismatch,
    Validation,
    InvalidFilter,
    BadCredentials,
    NotAuthorized,
    DbFailure,
    Failure,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Book already owned by user")]
    AlreadyOwned,

    #[error("Payload id {payload:?} does not match target id {target}")]
    IdMismatch { payload: Option<i64>, target: i64 },

    #[error("Validation error on {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Provided password doesn't match user's password")]
    BadCredentials,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure on a named field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    /// Offending field for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message, field) = match &self {
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorKind::NotFound, msg.clone(), None)
            }
            AppError::UserNotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorKind::UserNotFound, msg.clone(), None)
            }
            AppError::AlreadyOwned => (
                StatusCode::CONFLICT,
                ErrorKind::AlreadyOwned,
                self.to_string(),
                None,
            ),
            AppError::IdMismatch { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::IdMismatch,
                self.to_string(),
                None,
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorKind::Validation,
                message.clone(),
                Some(*field),
            ),
            AppError::InvalidFilter(msg) => {
                (StatusCode::BAD_REQUEST, ErrorKind::InvalidFilter, msg.clone(), None)
            }
            AppError::BadCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorKind::BadCredentials,
                self.to_string(),
                None,
            ),
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorKind::NotAuthorized, msg.clone(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::DbFailure,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::Failure,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: kind,
            message,
            field,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::UserNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::AlreadyOwned), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AppError::IdMismatch { payload: Some(1), target: 2 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::validation("title", "must not be empty")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::InvalidFilter("bad date".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::BadCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::Authentication("missing header".into())),
            StatusCode::UNAUTHORIZED
        );
    }
}
