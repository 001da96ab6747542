//! # Error Handling Middleware
//!
//! Maps the engine's typed rejections to HTTP status codes and JSON
//! error bodies, keeping the mapping in one place so handlers can use
//! `?` throughout.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use gymbook_core::errors::BookingError;

/// Application error wrapper that provides HTTP status code mapping.
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map rejection kinds to HTTP status codes
        let status = match &self.0 {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Conflict(_) | BookingError::AlreadyCancelled => StatusCode::CONFLICT,
            BookingError::MembershipExpired
            | BookingError::NoSessionsLeft
            | BookingError::TooLate { .. } => StatusCode::FORBIDDEN,
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::StorageContention | BookingError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Infrastructure failures stay opaque to the caller.
        let message = match &self.0 {
            BookingError::StorageContention | BookingError::Database(_) => {
                tracing::error!("Internal error serving request: {}", self.0);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Allows using `?` with functions that return `Result<T, BookingError>`.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Allows using `?` with functions that return `Result<T, eyre::Report>`.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}
