//! Manut Client - data access for the manutention console
//!
//! Traits for the remote site directory, dispatch store, settings table
//! and auth API, with a REST implementation and an in-memory backend.

pub mod config;
pub mod error;
pub mod memory;
pub mod rest;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use memory::MemoryBackend;
pub use rest::RestClient;
pub use store::{AuthApi, Backend, DispatchQuery, DispatchStore, SettingsStore, SharedBackend, SiteDirectory};
