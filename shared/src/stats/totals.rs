//! Daily and monthly quantity totals

use super::bucket::{BucketZone, DayBucket, MonthBucket};
use crate::models::DispatchRecord;

/// Sum of quantities dispatched on `day`
pub fn total_for_day(records: &[DispatchRecord], day: DayBucket, zone: BucketZone) -> i64 {
    records
        .iter()
        .filter(|r| zone.day_of(r.created_at) == day)
        .map(DispatchRecord::contribution)
        .fold(0, i64::saturating_add)
}

/// Sum of quantities dispatched during `month`
pub fn total_for_month(records: &[DispatchRecord], month: MonthBucket, zone: BucketZone) -> i64 {
    records
        .iter()
        .filter(|r| zone.month_of(r.created_at) == month)
        .map(DispatchRecord::contribution)
        .fold(0, i64::saturating_add)
}

/// Number of dispatch operations recorded during `month`
pub fn count_for_month(records: &[DispatchRecord], month: MonthBucket, zone: BucketZone) -> usize {
    records
        .iter()
        .filter(|r| zone.month_of(r.created_at) == month)
        .count()
}
