//! Reports - 月度报表
//!
//! Month selection can change while a load is in flight; only the load
//! holding the latest request token may publish its view.

use chrono::{DateTime, Utc};
use manut_client::{ClientError, DispatchQuery, DispatchStore, SharedBackend};
use parking_lot::Mutex;
use serde::Serialize;
use shared::models::DispatchRecord;
use shared::stats::{
    self, AggregatedSiteActivity, BucketZone, DEFAULT_TOP_LIMIT, DayBucket, MonthBucket, WEEK_LEN,
    YEAR_LEN,
};

use super::ERROR_TITLE;
use crate::core::{Loaded, Notice, RequestSequence};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub month: MonthBucket,
    /// Last day covered by the weekly trend
    pub reference: DayBucket,
    pub total: i64,
    pub dispatch_count: usize,
    pub top_sites: Vec<AggregatedSiteActivity>,
    /// 7 daily totals ending at `reference`, oldest first
    pub weekly_trend: [i64; WEEK_LEN],
    /// 12 monthly totals ending at `month`, oldest first
    pub monthly_trend: [i64; YEAR_LEN],
}

impl ReportView {
    pub fn compute(records: &[DispatchRecord], month: MonthBucket, reference: DayBucket, zone: BucketZone) -> Self {
        Self {
            month,
            reference,
            total: stats::total_for_month(records, month, zone),
            dispatch_count: stats::count_for_month(records, month, zone),
            top_sites: stats::top_sites_by_quantity(records, month, DEFAULT_TOP_LIMIT, zone),
            weekly_trend: stats::weekly_trend(records, reference, zone),
            monthly_trend: stats::monthly_trend(records, reference, zone),
        }
    }

    fn empty(month: MonthBucket, reference: DayBucket) -> Self {
        Self::compute(&[], month, reference, BucketZone::utc())
    }
}

/// Reference day for a month's weekly trend
///
/// Today when `month` is the current month, otherwise the month's last day.
pub fn reference_day(month: MonthBucket, today: DayBucket) -> DayBucket {
    if today.month() == month {
        today
    } else {
        month.last_day()
    }
}

pub struct ReportsController {
    backend: SharedBackend,
    zone: BucketZone,
    sequence: RequestSequence,
    last: Mutex<Option<ReportView>>,
}

impl ReportsController {
    pub fn new(backend: SharedBackend, zone: BucketZone) -> Self {
        Self {
            backend,
            zone,
            sequence: RequestSequence::new(),
            last: Mutex::new(None),
        }
    }

    /// Load the report for `month`
    ///
    /// Returns `None` when a newer `load_month` call was issued while this
    /// one was waiting; the superseded result is discarded.
    pub async fn load_month(&self, month: MonthBucket, now: DateTime<Utc>) -> Option<Loaded<ReportView>> {
        let token = self.sequence.next();
        let reference = reference_day(month, self.zone.day_of(now));

        // covers the 12-month window, which contains the weekly window
        let from = self.zone.day_start(month.offset(-(YEAR_LEN as i64 - 1)).first_day());
        let before = self.zone.day_start(month.last_day().offset(1));
        let query = DispatchQuery::new().between(from, before);

        let result = self.backend.fetch_dispatches(Some(&query)).await;

        if !self.sequence.is_latest(token) {
            tracing::debug!(month = %month, token = token.value(), "Discarding stale report load");
            return None;
        }

        let loaded = match result {
            Ok(records) => {
                let view = ReportView::compute(&records, month, reference, self.zone);
                tracing::debug!(month = %month, total = view.total, "Report loaded");
                *self.last.lock() = Some(view.clone());
                Loaded::ok(view)
            }
            Err(e) => {
                let err = ClientError::into_fetch(e);
                tracing::warn!(month = %month, code = %err.code, "Failed to load report: {}", err.message);
                let view = self
                    .last
                    .lock()
                    .clone()
                    .unwrap_or_else(|| ReportView::empty(month, reference));
                Loaded::with_notices(
                    view,
                    vec![Notice::error(ERROR_TITLE, "Impossible de charger l'historique des envois.")],
                )
            }
        };
        Some(loaded)
    }

    pub fn view(&self) -> Option<ReportView> {
        self.last.lock().clone()
    }
}
