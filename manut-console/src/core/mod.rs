//! Core infrastructure: configuration, logging, session and load plumbing

pub mod config;
pub mod logger;
pub mod notice;
pub mod sequence;
pub mod session;

pub use config::AppConfig;
pub use logger::init_logger_with_file;
pub use notice::{Loaded, Notice, NoticeLevel};
pub use sequence::{RequestSequence, RequestToken};
pub use session::{SessionContext, SessionError};
