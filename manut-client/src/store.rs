//! Data access traits
//!
//! One trait per remote resource. Every method is a single round trip;
//! callers own any retry or supersession policy.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{AuthSession, AuthUser, DispatchRecord, NewDispatch, Site, UserSettings, UserUpdate};

use crate::ClientResult;

/// Client site directory (read-only)
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// All sites, ordered by name ascending
    async fn fetch_sites(&self) -> ClientResult<Vec<Site>>;
}

/// Dispatch record store (append-only)
#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// Dispatches joined with their site name, `created_at` descending
    async fn fetch_dispatches(&self, query: Option<&DispatchQuery>) -> ClientResult<Vec<DispatchRecord>>;

    /// Record a dispatch and return the stored row
    async fn create_dispatch(&self, dispatch: &NewDispatch) -> ClientResult<DispatchRecord>;
}

/// Per-user settings table
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, `None` when the user has no row yet
    async fn load_settings(&self, user_id: &str) -> ClientResult<Option<UserSettings>>;

    /// Insert or replace the user's row
    async fn upsert_settings(&self, user_id: &str, settings: &UserSettings) -> ClientResult<UserSettings>;
}

/// Identity provider
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Password sign-in; the returned token is used for later calls
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    /// Revoke the current token
    async fn sign_out(&self) -> ClientResult<()>;

    /// User owning the current token
    async fn current_user(&self) -> ClientResult<AuthUser>;

    async fn update_user(&self, update: &UserUpdate) -> ClientResult<AuthUser>;

    /// Replace the token used for authenticated calls
    fn set_access_token(&self, token: Option<String>);
}

/// Everything the console needs from one backend
pub trait Backend: SiteDirectory + DispatchStore + SettingsStore + AuthApi {}

impl<T> Backend for T where T: SiteDirectory + DispatchStore + SettingsStore + AuthApi {}

pub type SharedBackend = Arc<dyn Backend>;

/// Server-side narrowing for [`DispatchStore::fetch_dispatches`]
///
/// `created_from` is inclusive, `created_before` exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchQuery {
    pub site_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl DispatchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_before = Some(before);
        self
    }

    pub fn matches(&self, record: &DispatchRecord) -> bool {
        self.site_id.as_deref().is_none_or(|id| record.site_id == id)
            && self.created_from.is_none_or(|from| record.created_at >= from)
            && self.created_before.is_none_or(|before| record.created_at < before)
    }

    /// PostgREST filter parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(id) = &self.site_id {
            params.push(("site_id".to_string(), format!("eq.{}", id)));
        }
        if let Some(from) = self.created_from {
            params.push(("created_at".to_string(), format!("gte.{}", from.to_rfc3339())));
        }
        if let Some(before) = self.created_before {
            params.push(("created_at".to_string(), format!("lt.{}", before.to_rfc3339())));
        }
        params
    }
}
