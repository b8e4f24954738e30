use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use chrono::TimeDelta;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::catalog::RemoteError;
use crate::services::cooldown;

pub const FROZEN_MESSAGE: &str =
    "This course can no longer be updated with its stored token. Run a full sync with a fresh token.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Course access token has been revoked")]
    Frozen,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Update cooldown active for another {remaining}")]
    RateLimited { remaining: TimeDelta },

    #[error("Sync queue is full")]
    QueueFull,

    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_hours: Option<f64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut remaining_hours = None;
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Remote(RemoteError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "Upstream rejected the access token".to_string(),
            ),
            AppError::Frozen => (StatusCode::FORBIDDEN, FROZEN_MESSAGE.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::RateLimited { remaining } => {
                let hours = cooldown::as_hours(remaining);
                remaining_hours = Some(hours);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    format!("Please wait {:.1} hours before updating again.", hours),
                )
            }
            AppError::QueueFull => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Too many sync jobs queued, try again shortly".to_string(),
            ),
            AppError::Remote(e) => {
                error!("upstream error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
            remaining_hours,
        });

        (status, body).into_response()
    }
}
