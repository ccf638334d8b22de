//! History - 派遣历史表格（筛选 + 分页 + CSV）

use manut_client::{ClientError, SharedBackend};
use parking_lot::Mutex;
use serde::Serialize;
use shared::models::{DispatchRecord, Site};
use shared::stats::{self, BucketZone, FilterCriteria, PageLink};

use super::{ERROR_TITLE, fetch_snapshot};
use crate::core::{Loaded, Notice, RequestSequence};
use crate::export;

/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One rendered page of the history table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub rows: Vec<DispatchRecord>,
    /// 1-indexed current page
    pub page: usize,
    pub total_pages: usize,
    /// Rows matching the current filters
    pub total_records: usize,
    pub links: Vec<PageLink>,
}

#[derive(Debug, Default)]
struct HistoryState {
    records: Vec<DispatchRecord>,
    sites: Vec<Site>,
    criteria: FilterCriteria,
    filtered: Vec<DispatchRecord>,
    page: usize,
}

impl HistoryState {
    fn refilter(&mut self, zone: BucketZone) {
        self.filtered = stats::filter_history(&self.records, &self.criteria, zone);
    }

    fn render(&self, page_size: usize) -> HistoryPage {
        let total_pages = stats::page_count(self.filtered.len(), page_size);
        HistoryPage {
            rows: stats::paginate(&self.filtered, page_size, self.page).to_vec(),
            page: self.page,
            total_pages,
            total_records: self.filtered.len(),
            links: stats::page_window(self.page, total_pages),
        }
    }
}

pub struct HistoryController {
    backend: SharedBackend,
    zone: BucketZone,
    page_size: usize,
    sequence: RequestSequence,
    state: Mutex<HistoryState>,
}

impl HistoryController {
    pub fn new(backend: SharedBackend, zone: BucketZone) -> Self {
        Self {
            backend,
            zone,
            page_size: DEFAULT_PAGE_SIZE,
            sequence: RequestSequence::new(),
            state: Mutex::new(HistoryState {
                page: 1,
                ..Default::default()
            }),
        }
    }

    /// Rows per page; values below 1 fall back to the default
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        self
    }

    /// Fetch sites (for the filter) and the dispatch history
    ///
    /// Current filters are kept and re-applied; the page is clamped to the
    /// new page count. Returns `None` when a newer load was issued while
    /// this one waited; its response is dropped.
    pub async fn load(&self) -> Option<Loaded<HistoryPage>> {
        let token = self.sequence.next();
        let (sites, dispatches) = fetch_snapshot(&self.backend, None).await;

        if !self.sequence.is_latest(token) {
            tracing::debug!(token = token.value(), "Discarding stale history load");
            return None;
        }
        let mut notices = Vec::new();

        let mut state = self.state.lock();
        match sites {
            Ok(sites) => state.sites = sites,
            Err(e) => {
                let err = ClientError::into_fetch(e);
                tracing::warn!(code = %err.code, "Failed to load client sites: {}", err.message);
                notices.push(Notice::error(
                    ERROR_TITLE,
                    "Impossible de charger les sites clients pour le filtre.",
                ));
            }
        }
        match dispatches {
            Ok(records) => {
                state.records = stats::join_site_names(records, &state.sites);
                state.refilter(self.zone);
            }
            Err(e) => {
                let err = ClientError::into_fetch(e);
                tracing::warn!(code = %err.code, "Failed to load dispatches: {}", err.message);
                notices.push(Notice::error(
                    ERROR_TITLE,
                    "Impossible de charger l'historique des envois.",
                ));
            }
        }

        let last_page = stats::page_count(state.filtered.len(), self.page_size).max(1);
        state.page = state.page.clamp(1, last_page);
        tracing::debug!(records = state.records.len(), shown = state.filtered.len(), "History loaded");
        Some(Loaded::with_notices(state.render(self.page_size), notices))
    }

    /// Replace the filters and return to the first page
    pub fn apply_filters(&self, criteria: FilterCriteria) -> HistoryPage {
        let mut state = self.state.lock();
        state.criteria = criteria;
        state.page = 1;
        state.refilter(self.zone);
        state.render(self.page_size)
    }

    pub fn reset_filters(&self) -> HistoryPage {
        self.apply_filters(FilterCriteria::default())
    }

    /// Jump to page `n`, clamped to the available pages
    pub fn go_to_page(&self, n: usize) -> HistoryPage {
        let mut state = self.state.lock();
        let last_page = stats::page_count(state.filtered.len(), self.page_size).max(1);
        state.page = n.clamp(1, last_page);
        state.render(self.page_size)
    }

    pub fn page(&self) -> HistoryPage {
        self.state.lock().render(self.page_size)
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state.lock().criteria.clone()
    }

    /// Sites available for the site filter
    pub fn sites(&self) -> Vec<Site> {
        self.state.lock().sites.clone()
    }

    /// CSV of every filtered row (not just the current page)
    pub fn export_csv(&self) -> Vec<u8> {
        export::history_csv(&self.state.lock().filtered, self.zone)
    }
}
