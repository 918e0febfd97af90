//! Common error types for the image gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Provider '{provider}' is not configured: missing {variable}")]
    MissingSecret {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Provider quota exceeded ({status}): {body}")]
    QuotaExceeded { status: u16, body: String },

    #[error("Maximum retries reached after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status captured from the provider, if this failure carries one
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            AppError::Provider { status, .. } | AppError::QuotaExceeded { status, .. } => {
                Some(*status)
            }
            AppError::RetriesExhausted { source, .. } => source.provider_status(),
            _ => None,
        }
    }

    /// Whether the failure came from a non-retryable provider condition
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppError::QuotaExceeded { .. })
    }

    fn status_code(&self) -> StatusCode {
        if let Some(status) = self
            .provider_status()
            .and_then(|s| StatusCode::from_u16(s).ok())
        {
            return status;
        }

        match self {
            AppError::Json(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingSecret { .. } | AppError::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::HttpClient(_) | AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::RetriesExhausted { source, .. } => source.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
