//! SessionContext - 当前用户会话与主题
//!
//! Explicitly scoped replacement for process-wide auth/theme state:
//! - `init()` restores the cached session from `{work_dir}/auth/session.json`
//! - `logout()` tears everything down (remote token, cache file, subscribers)
//! - `subscribe()` hands out passive change notifications

use std::path::{Path, PathBuf};

use manut_client::{ClientError, SharedBackend};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{AuthSession, AuthUser, DEFAULT_USERNAME, ThemePreference, UserMetadata, UserUpdate};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::storage(err.to_string())
    }
}

/// 会话缓存文件: {work_dir}/auth/session.json
#[derive(Debug, Clone)]
struct SessionCache {
    file_path: PathBuf,
}

impl SessionCache {
    fn new(work_dir: &Path) -> Self {
        Self {
            file_path: work_dir.join("auth/session.json"),
        }
    }

    fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.file_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        // 确保 auth 目录存在
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.file_path, content)?;
        tracing::debug!(user_id = %session.user.id, "Session cached");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if self.file_path.exists() {
            std::fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}

/// 主题文件内容: {work_dir}/theme.json
#[derive(Debug, Default, Serialize, Deserialize)]
struct ThemeFile {
    theme: ThemePreference,
}

/// Current user session and UI theme
pub struct SessionContext {
    backend: SharedBackend,
    cache: SessionCache,
    theme_path: PathBuf,
    session: Mutex<Option<AuthSession>>,
    theme: Mutex<ThemePreference>,
    user_tx: watch::Sender<Option<AuthUser>>,
}

impl SessionContext {
    pub fn new(backend: SharedBackend, work_dir: &Path) -> Self {
        let (user_tx, _) = watch::channel(None);
        Self {
            backend,
            cache: SessionCache::new(work_dir),
            theme_path: work_dir.join("theme.json"),
            session: Mutex::new(None),
            theme: Mutex::new(ThemePreference::default()),
            user_tx,
        }
    }

    /// Restore theme and cached session
    ///
    /// An unreadable, expired or rejected session leaves the context
    /// signed out; it is never an error.
    pub async fn init(&self) -> Option<AuthUser> {
        *self.theme.lock() = self.load_theme();

        let cached = match self.cache.load() {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Discarding unreadable session cache: {}", e);
                self.discard_cache();
                None
            }
        };
        let session = cached?;

        if session.is_expired_at(shared::util::now_secs()) {
            tracing::info!(user_id = %session.user.id, "Cached session expired");
            self.discard_cache();
            return None;
        }

        self.backend.set_access_token(Some(session.access_token.clone()));
        match self.backend.current_user().await {
            Ok(user) => {
                let session = AuthSession {
                    user: user.clone(),
                    ..session
                };
                if let Err(e) = self.cache.save(&session) {
                    tracing::warn!("Failed to refresh session cache: {}", e);
                }
                self.install(Some(session));
                tracing::info!(user_id = %user.id, "Session restored");
                Some(user)
            }
            Err(e) => {
                tracing::warn!("Cached session rejected: {}", e);
                self.backend.set_access_token(None);
                self.discard_cache();
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Veuillez vérifier vos identifiants.",
            ));
        }

        let session = self.backend.sign_in(email, password).await.map_err(|e| match e {
            ClientError::Unauthorized => AppError::invalid_credentials(),
            other => other.into(),
        })?;

        if let Err(e) = self.cache.save(&session) {
            tracing::warn!("Failed to cache session: {}", e);
        }
        let user = session.user.clone();
        self.install(Some(session));
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Sign out and clear every trace of the session
    pub async fn logout(&self) -> AppResult<()> {
        if let Err(e) = self.backend.sign_out().await {
            tracing::warn!("Remote sign-out failed: {}", e);
        }
        self.install(None);
        self.cache.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Change the metadata username
    ///
    /// Returns `false` when `name` equals the current display name.
    pub async fn update_username(&self, name: &str) -> AppResult<bool> {
        self.require_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Le nom d'utilisateur ne peut pas être vide.",
            ));
        }
        if name == self.username() {
            return Ok(false);
        }

        let update = UserUpdate {
            password: None,
            data: Some(UserMetadata {
                username: Some(name.to_string()),
            }),
        };
        let user = self.backend.update_user(&update).await.map_err(ClientError::into_write)?;
        self.replace_user(user);
        Ok(true)
    }

    pub async fn update_password(&self, password: &str, confirmation: &str) -> AppResult<()> {
        self.require_user()?;
        if password != confirmation {
            return Err(AppError::validation("Les nouveaux mots de passe ne correspondent pas."));
        }
        if password.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Veuillez saisir un nouveau mot de passe.",
            ));
        }

        let update = UserUpdate {
            password: Some(password.to_string()),
            data: None,
        };
        self.backend.update_user(&update).await.map_err(ClientError::into_write)?;
        tracing::info!("Password updated");
        Ok(())
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.lock().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Guard for screens that need a signed-in user
    pub fn require_user(&self) -> AppResult<AuthUser> {
        self.current_user().ok_or_else(AppError::not_authenticated)
    }

    /// Display name of the current user
    pub fn username(&self) -> String {
        self.current_user()
            .map(|u| u.display_name())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.user_tx.subscribe()
    }

    pub fn theme(&self) -> ThemePreference {
        *self.theme.lock()
    }

    pub fn set_theme(&self, theme: ThemePreference) -> AppResult<()> {
        *self.theme.lock() = theme;
        if let Some(parent) = self.theme_path.parent() {
            std::fs::create_dir_all(parent).map_err(SessionError::from)?;
        }
        let content = serde_json::to_string(&ThemeFile { theme }).map_err(SessionError::from)?;
        std::fs::write(&self.theme_path, content).map_err(SessionError::from)?;
        tracing::debug!(theme = theme.as_str(), "Theme saved");
        Ok(())
    }

    fn load_theme(&self) -> ThemePreference {
        std::fs::read_to_string(&self.theme_path)
            .ok()
            .and_then(|content| serde_json::from_str::<ThemeFile>(&content).ok())
            .map(|file| file.theme)
            .unwrap_or_default()
    }

    fn install(&self, session: Option<AuthSession>) {
        let user = session.as_ref().map(|s| s.user.clone());
        *self.session.lock() = session;
        self.user_tx.send_replace(user);
    }

    fn replace_user(&self, user: AuthUser) {
        let updated = {
            let mut guard = self.session.lock();
            guard.as_mut().map(|s| {
                s.user = user;
                s.clone()
            })
        };
        if let Some(session) = updated {
            if let Err(e) = self.cache.save(&session) {
                tracing::warn!("Failed to cache session: {}", e);
            }
            self.user_tx.send_replace(Some(session.user));
        }
    }

    fn discard_cache(&self) {
        if let Err(e) = self.cache.clear() {
            tracing::warn!("Failed to remove session cache: {}", e);
        }
    }
}
