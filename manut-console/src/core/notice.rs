//! User-visible notices (toasts) and the load result wrapper

use serde::{Deserialize, Serialize};
use shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short message shown to the user after an action or a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, description)
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, description)
    }

    /// Error notice carrying the error's own message
    pub fn from_error(title: impl Into<String>, err: &AppError) -> Self {
        Self::error(title, err.message.clone())
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Outcome of a controller load
///
/// `view` is always usable: on failure it holds the last good view (or an
/// empty one) and `notices` explains what went wrong.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub view: T,
    pub notices: Vec<Notice>,
}

impl<T> Loaded<T> {
    pub fn ok(view: T) -> Self {
        Self {
            view,
            notices: Vec::new(),
        }
    }

    pub fn with_notices(view: T, notices: Vec<Notice>) -> Self {
        Self { view, notices }
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(Notice::is_error)
    }
}
