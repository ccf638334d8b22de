//! Dashboard - 今日/本月概览

use std::sync::Arc;

use chrono::{DateTime, Utc};
use manut_client::{ClientError, SharedBackend};
use parking_lot::Mutex;
use serde::Serialize;
use shared::models::DispatchRecord;
use shared::stats::{
    self, AggregatedSiteActivity, BucketZone, DEFAULT_TOP_LIMIT, DayBucket, MonthBucket,
};

use super::{ERROR_TITLE, fetch_snapshot};
use crate::core::{Loaded, Notice, RequestSequence, SessionContext};

/// Dispatches shown under "Activité récente"
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub greeting_name: String,
    pub today: DayBucket,
    pub month: MonthBucket,
    pub today_total: i64,
    pub month_total: i64,
    pub month_dispatch_count: usize,
    pub site_count: usize,
    pub top_sites: Vec<AggregatedSiteActivity>,
    pub recent: Vec<DispatchRecord>,
}

impl DashboardView {
    fn empty(greeting_name: String, today: DayBucket) -> Self {
        Self {
            greeting_name,
            today,
            month: today.month(),
            today_total: 0,
            month_total: 0,
            month_dispatch_count: 0,
            site_count: 0,
            top_sites: Vec::new(),
            recent: Vec::new(),
        }
    }

    fn compute(records: &[DispatchRecord], today: DayBucket, zone: BucketZone) -> Self {
        let month = today.month();
        Self {
            greeting_name: String::new(),
            today,
            month,
            today_total: stats::total_for_day(records, today, zone),
            month_total: stats::total_for_month(records, month, zone),
            month_dispatch_count: stats::count_for_month(records, month, zone),
            site_count: 0,
            top_sites: stats::top_sites_by_quantity(records, month, DEFAULT_TOP_LIMIT, zone),
            recent: stats::recent(records, RECENT_LIMIT),
        }
    }
}

pub struct DashboardController {
    backend: SharedBackend,
    session: Arc<SessionContext>,
    zone: BucketZone,
    sequence: RequestSequence,
    last: Mutex<Option<DashboardView>>,
}

impl DashboardController {
    pub fn new(backend: SharedBackend, session: Arc<SessionContext>, zone: BucketZone) -> Self {
        Self {
            backend,
            session,
            zone,
            sequence: RequestSequence::new(),
            last: Mutex::new(None),
        }
    }

    /// Reload the dashboard as of `now`
    ///
    /// A failed fetch keeps the matching part of the previous view.
    /// Returns `None` when a newer load was issued while this one waited.
    pub async fn load(&self, now: DateTime<Utc>) -> Option<Loaded<DashboardView>> {
        let token = self.sequence.next();
        let today = self.zone.day_of(now);
        let (sites, dispatches) = fetch_snapshot(&self.backend, None).await;

        if !self.sequence.is_latest(token) {
            tracing::debug!(token = token.value(), "Discarding stale dashboard load");
            return None;
        }

        let previous = self.last.lock().clone();
        let mut notices = Vec::new();

        let sites = match sites {
            Ok(sites) => Some(sites),
            Err(e) => {
                let err = ClientError::into_fetch(e);
                tracing::warn!(code = %err.code, "Failed to load client sites: {}", err.message);
                notices.push(Notice::error(ERROR_TITLE, "Impossible de charger les sites clients."));
                None
            }
        };

        let mut view = match dispatches {
            Ok(records) => {
                let records = match &sites {
                    Some(sites) => stats::join_site_names(records, sites),
                    None => records,
                };
                DashboardView::compute(&records, today, self.zone)
            }
            Err(e) => {
                let err = ClientError::into_fetch(e);
                tracing::warn!(code = %err.code, "Failed to load dispatches: {}", err.message);
                notices.push(Notice::error(
                    ERROR_TITLE,
                    "Impossible de charger l'historique des envois.",
                ));
                previous
                    .clone()
                    .unwrap_or_else(|| DashboardView::empty(String::new(), today))
            }
        };

        view.greeting_name = self.session.username();
        view.site_count = match &sites {
            Some(sites) => sites.len(),
            None => previous.as_ref().map_or(0, |v| v.site_count),
        };

        tracing::debug!(
            today = %view.today,
            today_total = view.today_total,
            month_total = view.month_total,
            "Dashboard loaded"
        );
        *self.last.lock() = Some(view.clone());
        Some(Loaded::with_notices(view, notices))
    }

    /// Last computed view, if any
    pub fn view(&self) -> Option<DashboardView> {
        self.last.lock().clone()
    }
}
