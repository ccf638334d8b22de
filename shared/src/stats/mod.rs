//! 派遣聚合引擎
//!
//! Pure functions over in-memory dispatch snapshots: day/month totals,
//! per-site leaderboards, trend series, history filtering and pagination.
//! Nothing here performs I/O or reads the clock except
//! [`BucketZone::today`].

pub mod bucket;
pub mod history;
pub mod leaderboard;
pub mod sites;
pub mod totals;
pub mod trend;

pub use bucket::{BucketZone, DEFAULT_TIMEZONE, DayBucket, InvalidBucket, MonthBucket};
pub use history::{
    FilterCriteria, PageLink, filter_history, join_site_names, page_count, page_window, paginate,
    recent,
};
pub use leaderboard::{AggregatedSiteActivity, DEFAULT_TOP_LIMIT, site_activity, top_sites_by_quantity};
pub use sites::search_sites;
pub use totals::{count_for_month, total_for_day, total_for_month};
pub use trend::{WEEK_LEN, YEAR_LEN, monthly_trend, monthly_window, weekly_trend, weekly_window};
