//! In-process backend
//!
//! Implements every data-access trait over plain vectors. Used by tests
//! and by the console's offline demo.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    AuthSession, AuthUser, DispatchRecord, NewDispatch, Site, UserMetadata, UserSettings, UserUpdate,
};

use crate::store::{AuthApi, DispatchQuery, DispatchStore, SettingsStore, SiteDirectory};
use crate::{ClientError, ClientResult};

/// Session lifetime handed out by [`MemoryBackend::sign_in`] (seconds)
const SESSION_TTL: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Debug, Default)]
struct State {
    sites: Vec<Site>,
    dispatches: Vec<DispatchRecord>,
    settings: HashMap<String, UserSettings>,
    accounts: Vec<Account>,
    /// access token -> user id
    tokens: HashMap<String, String>,
    current_token: Option<String>,
    unavailable: bool,
}

/// In-memory implementation of [`crate::Backend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sites(self, sites: Vec<Site>) -> Self {
        self.state.write().sites = sites;
        self
    }

    pub fn with_dispatches(self, dispatches: Vec<DispatchRecord>) -> Self {
        self.state.write().dispatches = dispatches;
        self
    }

    /// Register an account for password sign-in
    pub fn with_account(self, email: &str, password: &str, username: Option<&str>) -> Self {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            user_metadata: UserMetadata {
                username: username.map(str::to_string),
            },
        };
        self.state.write().accounts.push(Account {
            password: password.to_string(),
            user,
        });
        self
    }

    /// Make every call fail as if the backend were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    pub fn dispatch_count(&self) -> usize {
        self.state.read().dispatches.len()
    }

    fn check_available(state: &State) -> ClientResult<()> {
        if state.unavailable {
            return Err(ClientError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn current_user_id(state: &State) -> ClientResult<String> {
        state
            .current_token
            .as_ref()
            .and_then(|t| state.tokens.get(t))
            .cloned()
            .ok_or(ClientError::Unauthorized)
    }
}

#[async_trait]
impl SiteDirectory for MemoryBackend {
    async fn fetch_sites(&self) -> ClientResult<Vec<Site>> {
        let state = self.state.read();
        Self::check_available(&state)?;
        let mut sites = state.sites.clone();
        sites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sites)
    }
}

#[async_trait]
impl DispatchStore for MemoryBackend {
    async fn fetch_dispatches(&self, query: Option<&DispatchQuery>) -> ClientResult<Vec<DispatchRecord>> {
        let state = self.state.read();
        Self::check_available(&state)?;

        let names: HashMap<&str, &str> = state
            .sites
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect();
        let mut records: Vec<DispatchRecord> = state
            .dispatches
            .iter()
            .filter(|r| query.is_none_or(|q| q.matches(r)))
            .cloned()
            .map(|mut r| {
                if r.site_name.is_none() {
                    r.site_name = names.get(r.site_id.as_str()).map(|n| n.to_string());
                }
                r
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn create_dispatch(&self, dispatch: &NewDispatch) -> ClientResult<DispatchRecord> {
        let mut state = self.state.write();
        Self::check_available(&state)?;
        Self::current_user_id(&state)?;

        let site = state
            .sites
            .iter()
            .find(|s| s.id == dispatch.site_id)
            .ok_or_else(|| ClientError::Validation(format!("unknown site_id {}", dispatch.site_id)))?;
        let record = DispatchRecord {
            id: uuid::Uuid::new_v4().to_string(),
            site_id: dispatch.site_id.clone(),
            site_name: Some(site.name.clone()),
            quantity: Some(dispatch.quantity),
            comment: dispatch.comment.clone(),
            created_at: chrono::Utc::now(),
            username: Some(dispatch.username.clone()),
            user_id: Some(dispatch.user_id.clone()),
        };
        state.dispatches.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl SettingsStore for MemoryBackend {
    async fn load_settings(&self, user_id: &str) -> ClientResult<Option<UserSettings>> {
        let state = self.state.read();
        Self::check_available(&state)?;
        Ok(state.settings.get(user_id).cloned())
    }

    async fn upsert_settings(&self, user_id: &str, settings: &UserSettings) -> ClientResult<UserSettings> {
        let mut state = self.state.write();
        Self::check_available(&state)?;
        state.settings.insert(user_id.to_string(), settings.clone());
        Ok(settings.clone())
    }
}

#[async_trait]
impl AuthApi for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let mut state = self.state.write();
        Self::check_available(&state)?;

        let user = state
            .accounts
            .iter()
            .find(|a| a.user.email.as_deref() == Some(email) && a.password == password)
            .map(|a| a.user.clone())
            .ok_or(ClientError::Unauthorized)?;
        let token = uuid::Uuid::new_v4().to_string();
        state.tokens.insert(token.clone(), user.id.clone());
        state.current_token = Some(token.clone());

        Ok(AuthSession {
            access_token: token,
            refresh_token: None,
            expires_at: Some(shared::util::now_secs() + SESSION_TTL),
            user,
        })
    }

    async fn sign_out(&self) -> ClientResult<()> {
        let mut state = self.state.write();
        if let Some(token) = state.current_token.take() {
            state.tokens.remove(&token);
        }
        Ok(())
    }

    async fn current_user(&self) -> ClientResult<AuthUser> {
        let state = self.state.read();
        Self::check_available(&state)?;
        let user_id = Self::current_user_id(&state)?;
        state
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or(ClientError::Unauthorized)
    }

    async fn update_user(&self, update: &UserUpdate) -> ClientResult<AuthUser> {
        let mut state = self.state.write();
        Self::check_available(&state)?;
        let user_id = Self::current_user_id(&state)?;
        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.user.id == user_id)
            .ok_or(ClientError::Unauthorized)?;

        if let Some(password) = &update.password {
            account.password = password.clone();
        }
        if let Some(data) = &update.data
            && data.username.is_some()
        {
            account.user.user_metadata.username = data.username.clone();
        }
        Ok(account.user.clone())
    }

    fn set_access_token(&self, token: Option<String>) {
        self.state.write().current_token = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_sites(vec![
                Site::new("s-2", "Quai 7", "Marseille"),
                Site::new("s-1", "Entrepôt Nord", "Lille"),
            ])
            .with_account("anna@ops.fr", "secret", None)
    }

    fn new_dispatch(site_id: &str) -> NewDispatch {
        NewDispatch {
            site_id: site_id.into(),
            quantity: 3,
            comment: Some("renfort".into()),
            user_id: "u".into(),
            username: "anna".into(),
        }
    }

    #[tokio::test]
    async fn test_sites_sorted_by_name() {
        let sites = backend().fetch_sites().await.unwrap();
        assert_eq!(sites[0].name, "Entrepôt Nord");
        assert_eq!(sites[1].name, "Quai 7");
    }

    #[tokio::test]
    async fn test_create_requires_session_and_known_site() {
        let backend = backend();
        assert!(matches!(
            backend.create_dispatch(&new_dispatch("s-1")).await,
            Err(ClientError::Unauthorized)
        ));

        backend.sign_in("anna@ops.fr", "secret").await.unwrap();
        assert!(matches!(
            backend.create_dispatch(&new_dispatch("nope")).await,
            Err(ClientError::Validation(_))
        ));

        let created = backend.create_dispatch(&new_dispatch("s-1")).await.unwrap();
        assert_eq!(created.site_name.as_deref(), Some("Entrepôt Nord"));
        assert_eq!(backend.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_joins_and_orders_descending() {
        let at = |d| Utc.with_ymd_and_hms(2024, 1, d, 8, 0, 0).unwrap();
        let record = |id: &str, d| DispatchRecord {
            id: id.into(),
            site_id: "s-2".into(),
            site_name: None,
            quantity: Some(1),
            comment: None,
            created_at: at(d),
            username: None,
            user_id: None,
        };
        let backend = backend().with_dispatches(vec![record("a", 1), record("b", 3), record("c", 2)]);

        let all = backend.fetch_dispatches(None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(all.iter().all(|r| r.site_name.as_deref() == Some("Quai 7")));

        let query = DispatchQuery::new().between(at(2), at(3));
        let ranged = backend.fetch_dispatches(Some(&query)).await.unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].id, "c");
    }

    #[tokio::test]
    async fn test_unavailable_fails_reads() {
        let backend = backend();
        backend.set_unavailable(true);
        assert!(matches!(
            backend.fetch_sites().await,
            Err(ClientError::Api { status: 503, .. })
        ));
        backend.set_unavailable(false);
        assert!(backend.fetch_sites().await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_and_update_user() {
        let backend = backend();
        assert!(matches!(
            backend.sign_in("anna@ops.fr", "wrong").await,
            Err(ClientError::Unauthorized)
        ));

        let session = backend.sign_in("anna@ops.fr", "secret").await.unwrap();
        assert!(session.expires_at.is_some());

        let updated = backend
            .update_user(&UserUpdate {
                password: None,
                data: Some(UserMetadata {
                    username: Some("Anna M.".into()),
                }),
            })
            .await
            .unwrap();
        assert_eq!(updated.user_metadata.username.as_deref(), Some("Anna M."));

        backend.sign_out().await.unwrap();
        assert!(matches!(backend.current_user().await, Err(ClientError::Unauthorized)));
    }
}
