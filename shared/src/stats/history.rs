//! History filtering and pagination

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::bucket::{BucketZone, DayBucket};
use crate::models::{DispatchRecord, Site};

/// History table filters
///
/// All present criteria must match (AND). Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_exact: Option<DayBucket>,
    /// Case-insensitive substring of the username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_substring: Option<String>,
}

impl FilterCriteria {
    pub fn site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn on_day(mut self, day: DayBucket) -> Self {
        self.date_exact = Some(day);
        self
    }

    pub fn username(mut self, needle: impl Into<String>) -> Self {
        self.username_substring = Some(needle.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.site_filter().is_none()
            && self.date_exact.is_none()
            && self.username_filter().is_none()
    }

    fn site_filter(&self) -> Option<&str> {
        self.site_id.as_deref().filter(|s| !s.is_empty())
    }

    fn username_filter(&self) -> Option<String> {
        self.username_substring
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Apply `criteria` to `records`, preserving input order
///
/// Site id is matched exactly, then the day bucket of `created_at`, then
/// the username substring. A record without a username never matches a
/// username filter.
pub fn filter_history(
    records: &[DispatchRecord],
    criteria: &FilterCriteria,
    zone: BucketZone,
) -> Vec<DispatchRecord> {
    let site = criteria.site_filter();
    let needle = criteria.username_filter();

    records
        .iter()
        .filter(|r| site.is_none_or(|id| r.site_id == id))
        .filter(|r| {
            criteria
                .date_exact
                .is_none_or(|day| zone.day_of(r.created_at) == day)
        })
        .filter(|r| match &needle {
            None => true,
            Some(needle) => r
                .username
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains(needle.as_str())),
        })
        .cloned()
        .collect()
}

/// Slice for a 1-indexed page
///
/// Page 0, a zero page size, or a page past the end all yield an empty slice.
pub fn paginate<T>(records: &[T], page_size: usize, page_number: usize) -> &[T] {
    if page_size == 0 || page_number == 0 {
        return &[];
    }
    let Some(start) = (page_number - 1).checked_mul(page_size) else {
        return &[];
    };
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(records.len());
    &records[start..end]
}

/// Number of pages needed for `len` rows (0 for an empty table)
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Entry of the pager bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Pager entries for `total` pages with `current` selected (both 1-indexed)
///
/// Shows the first two and last two pages plus the neighbours of the
/// current page; each collapsed run becomes one ellipsis. A single page
/// (or none) needs no pager and yields an empty list.
pub fn page_window(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total) as i64;
    let total = total as i64;

    let mut links = Vec::new();
    for number in 0..total {
        let visible = number < 2 || number > total - 3 || (number - (current - 1)).abs() < 2;
        if visible {
            links.push(PageLink::Page(number as usize + 1));
        } else if (number == 2 && current > 4) || (number == total - 3 && current < total - 3) {
            links.push(PageLink::Ellipsis);
        }
    }
    links
}

/// The `n` most recent dispatches, newest first
pub fn recent(records: &[DispatchRecord], n: usize) -> Vec<DispatchRecord> {
    let mut sorted: Vec<&DispatchRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(n).cloned().collect()
}

/// Fill missing `site_name`s from a site directory snapshot
pub fn join_site_names(records: Vec<DispatchRecord>, sites: &[Site]) -> Vec<DispatchRecord> {
    let names: HashMap<&str, &str> = sites
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    records
        .into_iter()
        .map(|mut r| {
            if r.site_name.is_none()
                && let Some(name) = names.get(r.site_id.as_str())
            {
                r.site_name = Some((*name).to_string());
            }
            r
        })
        .collect()
}
