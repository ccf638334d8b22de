//! Client sites - 站点目录与派遣登记

use std::sync::Arc;

use manut_client::{ClientError, DispatchStore, SharedBackend, SiteDirectory};
use parking_lot::Mutex;
use shared::error::{AppError, AppResult};
use shared::models::{DispatchRecord, NewDispatch, Site};
use shared::stats;

use super::ERROR_TITLE;
use crate::core::{Loaded, Notice, SessionContext};

/// Confirmation of a recorded dispatch
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    pub record: DispatchRecord,
    pub notice: Notice,
}

pub struct SitesController {
    backend: SharedBackend,
    session: Arc<SessionContext>,
    sites: Mutex<Vec<Site>>,
}

impl SitesController {
    pub fn new(backend: SharedBackend, session: Arc<SessionContext>) -> Self {
        Self {
            backend,
            session,
            sites: Mutex::new(Vec::new()),
        }
    }

    /// Reload the directory; on failure the previous list is kept
    pub async fn load(&self) -> Loaded<Vec<Site>> {
        match self.backend.fetch_sites().await {
            Ok(sites) => {
                tracing::debug!(count = sites.len(), "Client sites loaded");
                *self.sites.lock() = sites.clone();
                Loaded::ok(sites)
            }
            Err(e) => {
                let err = ClientError::into_fetch(e);
                tracing::warn!(code = %err.code, "Failed to load client sites: {}", err.message);
                Loaded::with_notices(
                    self.sites.lock().clone(),
                    vec![Notice::error(ERROR_TITLE, "Impossible de charger les sites clients.")],
                )
            }
        }
    }

    /// Sites matching `term` by name or address
    pub fn search(&self, term: &str) -> Vec<Site> {
        let sites = self.sites.lock();
        stats::search_sites(&sites, term).into_iter().cloned().collect()
    }

    /// Record `quantity` workers sent to `site_id`
    ///
    /// Rejects anonymous actors, quantities below 1 and sites missing from
    /// the directory before anything reaches the store.
    pub async fn send_workers(
        &self,
        site_id: &str,
        quantity: i64,
        comment: Option<&str>,
    ) -> AppResult<DispatchReceipt> {
        let user = self.session.require_user()?;
        if quantity < 1 {
            return Err(AppError::invalid_quantity(quantity));
        }
        let site = self.find_site(site_id).await?;

        let dispatch = NewDispatch {
            site_id: site.id.clone(),
            quantity,
            comment: comment.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string),
            user_id: user.id.clone(),
            username: self.session.username(),
        };
        let record = self
            .backend
            .create_dispatch(&dispatch)
            .await
            .map_err(ClientError::into_write)?;

        tracing::info!(site_id = %site.id, quantity, dispatch_id = %record.id, "Dispatch recorded");
        let notice = Notice::success(
            "Envoi confirmé!",
            format!("{} manutentionnaire(s) envoyé(s) à {}.", quantity, site.name),
        );
        Ok(DispatchReceipt { record, notice })
    }

    /// Notice for a failed [`Self::send_workers`]
    pub fn failure_notice(err: &AppError) -> Notice {
        Notice::from_error("Erreur d'enregistrement", err)
    }

    async fn find_site(&self, site_id: &str) -> AppResult<Site> {
        if let Some(site) = self.cached_site(site_id) {
            return Ok(site);
        }
        // directory may be stale or not loaded yet
        self.load().await;
        self.cached_site(site_id)
            .ok_or_else(|| AppError::site_not_found(site_id))
    }

    fn cached_site(&self, site_id: &str) -> Option<Site> {
        self.sites.lock().iter().find(|s| s.id == site_id).cloned()
    }
}
