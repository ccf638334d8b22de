//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Map a status returned by the remote backend onto an error code
    ///
    /// `fallback` is returned for statuses that carry no specific meaning
    /// (plain 5xx, unexpected 4xx). The REST client passes `InternalError`;
    /// the read or write call site then wraps it as `FetchFailed` or
    /// `PersistenceFailed`.
    pub fn from_http_status(status: StatusCode, fallback: ErrorCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::NotAuthenticated,
            StatusCode::FORBIDDEN => Self::PermissionDenied,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::AlreadyExists,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::ValidationFailed,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::TimeoutError,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => Self::NetworkError,
            s if s.is_success() => Self::Success,
            _ => fallback,
        }
    }
}
