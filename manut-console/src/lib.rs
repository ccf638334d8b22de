//! Manut Console - operations console for worker dispatches
//!
//! Controllers load data through [`manut_client`], hand snapshots to the
//! aggregation engine in [`shared::stats`] and return views plus notices
//! for the presenter.

pub mod controllers;
pub mod core;
pub mod demo;
pub mod export;
pub mod render;

pub use crate::core::{AppConfig, Loaded, Notice, NoticeLevel, RequestSequence, RequestToken, SessionContext};
