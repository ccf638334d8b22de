//! Client error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a more specific mapping
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint or duplicate
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Closest unified error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Api { status, .. } => http::StatusCode::from_u16(*status)
                .map(|s| ErrorCode::from_http_status(s, ErrorCode::InternalError))
                .unwrap_or(ErrorCode::InternalError),
            Self::InvalidResponse(_) | Self::Serialization(_) => ErrorCode::InvalidFormat,
            Self::Unauthorized => ErrorCode::NotAuthenticated,
            Self::Forbidden(_) => ErrorCode::PermissionDenied,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Conflict(_) => ErrorCode::AlreadyExists,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Wrap as `code`, keeping the transport-level code under `cause`
    pub fn into_app_error(self, code: ErrorCode) -> AppError {
        let cause = self.code();
        AppError::with_message(code, self.to_string()).with_detail("cause", cause.code())
    }

    /// Convert a failed read into a fetch error
    pub fn into_fetch(self) -> AppError {
        let cause = self.code();
        AppError::fetch(self.to_string()).with_detail("cause", cause.code())
    }

    /// Convert a failed write into a persistence error
    pub fn into_write(self) -> AppError {
        let cause = self.code();
        AppError::persistence(self.to_string()).with_detail("cause", cause.code())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::with_message(err.code(), err.to_string())
    }
}
