//! Settings - 用户偏好与账户

use std::sync::Arc;

use manut_client::{SettingsStore, SharedBackend};
use parking_lot::Mutex;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::UserSettings;

use super::ERROR_TITLE;
use crate::core::{Loaded, Notice, SessionContext};

pub struct SettingsController {
    backend: SharedBackend,
    session: Arc<SessionContext>,
    current: Mutex<Option<UserSettings>>,
}

impl SettingsController {
    pub fn new(backend: SharedBackend, session: Arc<SessionContext>) -> Self {
        Self {
            backend,
            session,
            current: Mutex::new(None),
        }
    }

    /// Load the signed-in user's settings
    ///
    /// A missing row is created with defaults. A failed read keeps the
    /// previous settings (or defaults) and reports a notice.
    pub async fn load(&self) -> AppResult<Loaded<UserSettings>> {
        let user = self.session.require_user()?;

        match self.backend.load_settings(&user.id).await {
            Ok(Some(settings)) => {
                *self.current.lock() = Some(settings.clone());
                Ok(Loaded::ok(settings))
            }
            Ok(None) => {
                tracing::info!(user_id = %user.id, "Creating default settings");
                let defaults = UserSettings::default();
                let mut notices = Vec::new();
                if let Err(e) = self.backend.upsert_settings(&user.id, &defaults).await {
                    let err = e.into_app_error(ErrorCode::SettingsSaveFailed);
                    tracing::warn!(code = %err.code, "Failed to create default settings: {}", err.message);
                    notices.push(Notice::error(ERROR_TITLE, err.message));
                }
                *self.current.lock() = Some(defaults.clone());
                Ok(Loaded::with_notices(defaults, notices))
            }
            Err(e) => {
                let err = e.into_app_error(ErrorCode::SettingsLoadFailed);
                tracing::warn!(code = %err.code, "Failed to load settings: {}", err.message);
                let settings = self.current.lock().clone().unwrap_or_default();
                Ok(Loaded::with_notices(
                    settings,
                    vec![Notice::error(ERROR_TITLE, "Impossible de charger les paramètres.")],
                ))
            }
        }
    }

    /// History rows per page from the saved `items_per_page`
    pub async fn page_size(&self) -> AppResult<usize> {
        let loaded = self.load().await?;
        tracing::debug!(items_per_page = loaded.view.items_per_page, "Page size from settings");
        Ok(loaded.view.items_per_page as usize)
    }

    /// Save `settings` for the signed-in user
    pub async fn update(&self, settings: UserSettings) -> AppResult<UserSettings> {
        let user = self.session.require_user()?;
        if settings.items_per_page == 0 {
            return Err(AppError::validation("items_per_page must be at least 1"));
        }
        if settings.refresh_interval == 0 {
            return Err(AppError::validation("refresh_interval must be at least 1"));
        }

        let saved = self
            .backend
            .upsert_settings(&user.id, &settings)
            .await
            .map_err(|e| e.into_app_error(ErrorCode::SettingsSaveFailed))?;
        tracing::info!(user_id = %user.id, "Settings saved");
        *self.current.lock() = Some(saved.clone());
        Ok(saved)
    }

    /// Restore every setting to its default
    pub async fn reset(&self) -> AppResult<UserSettings> {
        self.update(UserSettings::default()).await
    }

    pub fn current(&self) -> Option<UserSettings> {
        self.current.lock().clone()
    }

    /// Rename the user, as a notice for the presenter
    pub async fn change_username(&self, name: &str) -> Notice {
        match self.session.update_username(name).await {
            Ok(true) => Notice::success(
                "Succès",
                "Nom d'utilisateur (métadonnées) mis à jour. La connexion se fait toujours par email.",
            ),
            Ok(false) => Notice::info(
                "Information",
                "Le nouveau nom d'utilisateur est identique à l'actuel.",
            ),
            Err(e) => Notice::from_error(ERROR_TITLE, &e),
        }
    }

    pub async fn change_password(&self, password: &str, confirmation: &str) -> Notice {
        match self.session.update_password(password, confirmation).await {
            Ok(()) => Notice::success("Succès", "Mot de passe mis à jour."),
            Err(e) => Notice::from_error(ERROR_TITLE, &e),
        }
    }
}
