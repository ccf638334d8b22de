//! Shared types for the manutention console
//!
//! Common types used across crates: data models, the unified error
//! system and the dispatch aggregation engine.

pub mod error;
pub mod models;
pub mod stats;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
