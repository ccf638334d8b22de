//! Time series for the report charts

use super::bucket::{BucketZone, DayBucket, MonthBucket};
use crate::models::DispatchRecord;

/// Days in the weekly trend
pub const WEEK_LEN: usize = 7;
/// Months in the monthly trend
pub const YEAR_LEN: usize = 12;

/// The 7 days ending at `reference` inclusive, oldest first
pub fn weekly_window(reference: DayBucket) -> [DayBucket; WEEK_LEN] {
    std::array::from_fn(|i| reference.offset(i as i64 - (WEEK_LEN as i64 - 1)))
}

/// The 12 months ending at `reference`'s month inclusive, oldest first
pub fn monthly_window(reference: DayBucket) -> [MonthBucket; YEAR_LEN] {
    let last = reference.month();
    std::array::from_fn(|i| last.offset(i as i64 - (YEAR_LEN as i64 - 1)))
}

/// Daily totals for the 7 days ending at `reference`, oldest first
///
/// Each entry equals `total_for_day` for that day; computed in one pass.
pub fn weekly_trend(
    records: &[DispatchRecord],
    reference: DayBucket,
    zone: BucketZone,
) -> [i64; WEEK_LEN] {
    let start = reference.offset(-(WEEK_LEN as i64 - 1));
    let mut series = [0i64; WEEK_LEN];
    for record in records {
        let idx = zone.day_of(record.created_at).days_since(start);
        if (0..WEEK_LEN as i64).contains(&idx) {
            series[idx as usize] = series[idx as usize].saturating_add(record.contribution());
        }
    }
    series
}

/// Monthly totals for the 12 months ending at `reference`'s month, oldest first
pub fn monthly_trend(
    records: &[DispatchRecord],
    reference: DayBucket,
    zone: BucketZone,
) -> [i64; YEAR_LEN] {
    let start = reference.month().offset(-(YEAR_LEN as i64 - 1));
    let mut series = [0i64; YEAR_LEN];
    for record in records {
        let idx = zone.month_of(record.created_at).months_since(start);
        if (0..YEAR_LEN as i64).contains(&idx) {
            series[idx as usize] = series[idx as usize].saturating_add(record.contribution());
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::testing::dispatch_at;
    use crate::stats::{total_for_day, total_for_month};

    #[test]
    fn test_weekly_window() {
        let reference: DayBucket = "2024-03-02".parse().unwrap();
        let window: Vec<String> = weekly_window(reference).iter().map(|d| d.to_string()).collect();
        assert_eq!(
            window,
            vec![
                "2024-02-25",
                "2024-02-26",
                "2024-02-27",
                "2024-02-28",
                "2024-02-29",
                "2024-03-01",
                "2024-03-02",
            ]
        );
    }

    #[test]
    fn test_monthly_window_wraps_year() {
        let reference: DayBucket = "2024-03-15".parse().unwrap();
        let window = monthly_window(reference);
        assert_eq!(window[0].to_string(), "2023-04");
        assert_eq!(window[8].to_string(), "2023-12");
        assert_eq!(window[11].to_string(), "2024-03");
    }

    #[test]
    fn test_weekly_trend_matches_daily_totals() {
        let zone = BucketZone::utc();
        let records = vec![
            dispatch_at("1", "A", Some(3), "2024-03-02T08:00:00Z"),
            dispatch_at("2", "A", Some(1), "2024-03-02T18:00:00Z"),
            dispatch_at("3", "B", Some(5), "2024-02-27T08:00:00Z"),
            dispatch_at("4", "B", Some(9), "2024-02-25T00:00:00Z"),
            // outside the window on both sides
            dispatch_at("5", "B", Some(100), "2024-02-24T23:59:59Z"),
            dispatch_at("6", "B", Some(100), "2024-03-03T00:00:00Z"),
        ];
        let reference: DayBucket = "2024-03-02".parse().unwrap();
        let trend = weekly_trend(&records, reference, zone);
        assert_eq!(trend, [9, 0, 5, 0, 0, 0, 4]);

        for (day, total) in weekly_window(reference).iter().zip(trend) {
            assert_eq!(total_for_day(&records, *day, zone), total);
        }
    }

    #[test]
    fn test_monthly_trend_matches_monthly_totals() {
        let zone = BucketZone::utc();
        let records = vec![
            dispatch_at("1", "A", Some(2), "2023-04-01T00:00:00Z"),
            dispatch_at("2", "A", Some(3), "2023-12-31T12:00:00Z"),
            dispatch_at("3", "A", Some(4), "2024-03-31T12:00:00Z"),
            dispatch_at("4", "A", Some(50), "2023-03-31T12:00:00Z"),
        ];
        let reference: DayBucket = "2024-03-10".parse().unwrap();
        let trend = monthly_trend(&records, reference, zone);
        assert_eq!(trend, [2, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 4]);

        for (month, total) in monthly_window(reference).iter().zip(trend) {
            assert_eq!(total_for_month(&records, *month, zone), total);
        }
    }

    #[test]
    fn test_trend_buckets_saturate() {
        let zone = BucketZone::utc();
        let records = vec![
            dispatch_at("1", "A", Some(i64::MAX), "2024-03-10T08:00:00Z"),
            dispatch_at("2", "A", Some(i64::MAX), "2024-03-10T09:00:00Z"),
        ];
        let reference: DayBucket = "2024-03-10".parse().unwrap();
        assert_eq!(weekly_trend(&records, reference, zone)[WEEK_LEN - 1], i64::MAX);
        assert_eq!(monthly_trend(&records, reference, zone)[YEAR_LEN - 1], i64::MAX);
    }

    #[test]
    fn test_trends_on_empty_input_are_zero_filled() {
        let reference: DayBucket = "2024-03-10".parse().unwrap();
        assert_eq!(weekly_trend(&[], reference, BucketZone::utc()), [0; WEEK_LEN]);
        assert_eq!(monthly_trend(&[], reference, BucketZone::utc()), [0; YEAR_LEN]);
    }
}
