use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    /// Data a write depends on could not be loaded first.
    #[error("{0}")]
    Load(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    pub fn api(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        AppError::Api {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::Api { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            ),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Load(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Identity(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Http(e) => {
                error!("backend request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Backend request failed".to_string(),
                )
            }
            AppError::Decode(msg) => {
                error!("decode error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Unexpected backend response".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
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
        });

        (status, body).into_response()
    }
}
