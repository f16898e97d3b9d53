// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Invalid appointment event: {0}")]
    InvalidEvent(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No callable entry in partition {0}")]
    EmptyQueue(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transient store failures may be retried with backoff;
    /// everything else is a terminal answer for the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite
// by mapping to Database / StoreUnavailable / Conflict there.
