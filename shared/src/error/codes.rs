//! Unified error codes for the dispatch workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Dispatch errors (fetch / validation / persistence)
//! - 6xxx: Settings errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,

    // ==================== 2xxx: Permission ====================
    /// Permission denied (row level security rejected the request)
    PermissionDenied = 2001,

    // ==================== 4xxx: Dispatch ====================
    /// Reading the remote store failed
    FetchFailed = 4001,
    /// The remote store rejected a write
    PersistenceFailed = 4002,
    /// Dispatch quantity must be at least 1
    InvalidQuantity = 4003,
    /// Client site does not exist
    SiteNotFound = 4004,

    // ==================== 6xxx: Settings ====================
    /// User settings could not be loaded
    SettingsLoadFailed = 6001,
    /// User settings could not be saved
    SettingsSaveFailed = 6002,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Configuration error
    ConfigError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Request timed out
    TimeoutError = 9004,
    /// Local file IO failed
    StorageError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Failures that happen while reading the remote store
    pub const fn is_fetch(&self) -> bool {
        matches!(
            self,
            ErrorCode::FetchFailed
                | ErrorCode::SettingsLoadFailed
                | ErrorCode::NetworkError
                | ErrorCode::TimeoutError
        )
    }

    /// Input rejected before it reaches the store
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidQuantity
                | ErrorCode::RequiredField
                | ErrorCode::InvalidFormat
                | ErrorCode::SiteNotFound
        )
    }

    /// Writes rejected by the remote store
    pub const fn is_persistence(&self) -> bool {
        matches!(
            self,
            ErrorCode::PersistenceFailed | ErrorCode::SettingsSaveFailed
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Dispatch
            ErrorCode::FetchFailed => "Failed to load data from the remote store",
            ErrorCode::PersistenceFailed => "The remote store rejected the write",
            ErrorCode::InvalidQuantity => "Quantity must be at least 1",
            ErrorCode::SiteNotFound => "Client site not found",

            // Settings
            ErrorCode::SettingsLoadFailed => "Failed to load user settings",
            ErrorCode::SettingsSaveFailed => "Failed to save user settings",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Request timed out",
            ErrorCode::StorageError => "Local storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Dispatch
            4001 => Ok(ErrorCode::FetchFailed),
            4002 => Ok(ErrorCode::PersistenceFailed),
            4003 => Ok(ErrorCode::InvalidQuantity),
            4004 => Ok(ErrorCode::SiteNotFound),

            // Settings
            6001 => Ok(ErrorCode::SettingsLoadFailed),
            6002 => Ok(ErrorCode::SettingsSaveFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::ConfigError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
