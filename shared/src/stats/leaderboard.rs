//! Per-site leaderboard

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::bucket::{BucketZone, MonthBucket};
use crate::models::DispatchRecord;

/// Default leaderboard length on the dashboard
pub const DEFAULT_TOP_LIMIT: usize = 5;

/// Quantity received by one site over a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedSiteActivity {
    pub site_name: String,
    pub total_quantity: i64,
}

impl AggregatedSiteActivity {
    pub fn new(site_name: impl Into<String>, total_quantity: i64) -> Self {
        Self {
            site_name: site_name.into(),
            total_quantity,
        }
    }
}

/// Per-site totals for `month`, in first-occurrence order (unsorted)
///
/// Sites are keyed by display name; records without a name are grouped
/// under [`crate::models::UNKNOWN_SITE`].
pub fn site_activity(
    records: &[DispatchRecord],
    month: MonthBucket,
    zone: BucketZone,
) -> Vec<AggregatedSiteActivity> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut activity: Vec<AggregatedSiteActivity> = Vec::new();

    for record in records.iter().filter(|r| zone.month_of(r.created_at) == month) {
        let name = record.site_label();
        let idx = *slots.entry(name).or_insert_with(|| {
            activity.push(AggregatedSiteActivity::new(name, 0));
            activity.len() - 1
        });
        activity[idx].total_quantity = activity[idx].total_quantity.saturating_add(record.contribution());
    }

    activity
}

/// Top `limit` sites by quantity received during `month`
///
/// Sorted by total descending. The sort is stable, so sites with equal
/// totals keep the order in which they first appear in `records`.
pub fn top_sites_by_quantity(
    records: &[DispatchRecord],
    month: MonthBucket,
    limit: usize,
    zone: BucketZone,
) -> Vec<AggregatedSiteActivity> {
    let mut activity = site_activity(records, month, zone);
    activity.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    activity.truncate(limit);
    activity
}
