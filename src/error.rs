//! Error types for podshare
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Persistence failures are reported to the caller with their underlying
/// message; nothing here is sanitized.
#[derive(Debug, Error)]
pub enum AppError {
    /// Podcast not found (404)
    #[error("Podcast not found")]
    NotFound,

    /// Client input error (400)
    #[error("{0}")]
    Validation(String),

    /// Local database error (500)
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// Remote managed database error (500)
    #[error("{0}")]
    RemoteStore(String),

    /// Audio storage error (500)
    #[error("{0}")]
    Storage(String),

    /// HTTP client error (500)
    #[error("{0}")]
    HttpClient(#[from] reqwest::Error),

    /// Filesystem error (500)
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (500)
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Label used for the error metric
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::RemoteStore(_) => "remote_store",
            AppError::Storage(_) => "storage",
            AppError::HttpClient(_) => "http_client",
            AppError::Io(_) => "io",
            AppError::Json(_) => "json",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and a `{"error": ...}` JSON body.
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        }

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind()])
            .inc();

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
