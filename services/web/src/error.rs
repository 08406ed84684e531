//! Custom error types for the web service

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::views;

/// Failures that end a request with an error page
///
/// Form validation problems never end up here; they are reported to the
/// visitor as flash messages instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Requested record does not exist
    #[error("Not found")]
    NotFound,

    /// Database infrastructure error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),

    /// Malformed or oversized multipart body
    #[error("Invalid form data: {0}")]
    Multipart(#[from] MultipartError),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "The page you are looking for does not exist.".to_string(),
            ),
            AppError::Multipart(e) => {
                warn!("Rejected form data: {}", e);
                let status = e.status();
                let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "The uploaded file is too large.".to_string()
                } else {
                    e.body_text()
                };
                (status, message)
            }
            AppError::Database(_) | AppError::Internal(_) => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our side.".to_string(),
                )
            }
        };

        (status, views::error_page(status, &message)).into_response()
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;
