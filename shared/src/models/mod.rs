//! Data models
//!
//! Plain records mirrored from the remote tables. IDs are opaque strings
//! issued by the backend.

pub mod auth;
pub mod dispatch;
pub mod settings;
pub mod site;

// Re-exports
pub use auth::*;
pub use dispatch::*;
pub use settings::*;
pub use site::*;
