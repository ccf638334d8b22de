//! 日期分桶 - 业务时区下的日/月聚合键
//!
//! Every day/month key is derived from `created_at` converted into a single
//! configured timezone ([`BucketZone`]). "Today" is computed in the same
//! zone, so the dashboard's notion of today and the aggregation's notion
//! of today always agree.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default business timezone
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;

/// Error returned when a bucket string is not canonical
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} bucket: {value}")]
pub struct InvalidBucket {
    kind: &'static str,
    value: String,
}

impl InvalidBucket {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// DayBucket
// ============================================================================

/// Canonical day key (`YYYY-MM-DD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DayBucket(NaiveDate);

impl DayBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Month this day belongs to
    pub fn month(&self) -> MonthBucket {
        MonthBucket {
            year: self.0.year(),
            month: self.0.month(),
        }
    }

    /// Shift by a signed number of days, saturating at the calendar bounds
    pub fn offset(&self, days: i64) -> Self {
        let shifted = Duration::try_days(days).and_then(|d| self.0.checked_add_signed(d));
        Self(shifted.unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX }))
    }

    /// Signed number of days from `other` to `self`
    pub fn days_since(&self, other: DayBucket) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl From<NaiveDate> for DayBucket {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayBucket {
    type Err = InvalidBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 10 || s.as_bytes()[4] != b'-' || s.as_bytes()[7] != b'-' {
            return Err(InvalidBucket::new("day", s));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| InvalidBucket::new("day", s))
    }
}

impl From<DayBucket> for String {
    fn from(day: DayBucket) -> Self {
        day.to_string()
    }
}

impl TryFrom<String> for DayBucket {
    type Error = InvalidBucket;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// MonthBucket
// ============================================================================

/// Canonical month key (`YYYY-MM`)
///
/// Ordering follows the calendar (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthBucket {
    year: i32,
    month: u32,
}

impl MonthBucket {
    /// `month` is 1-based; returns None outside 1..=12
    ///
    /// `year` must leave a year of margin inside [`NaiveDate`]'s range so
    /// that `first_day`, `last_day` and the report windows stay valid.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let years = NaiveDate::MIN.year() + 1..NaiveDate::MAX.year();
        ((1..=12).contains(&month) && years.contains(&year)).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0, used for window arithmetic
    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    /// Shift by a signed number of months
    pub fn offset(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// Signed number of months from `other` to `self`
    pub fn months_since(&self, other: MonthBucket) -> i64 {
        self.ordinal() - other.ordinal()
    }

    pub fn first_day(&self) -> DayBucket {
        // month is validated on construction
        DayBucket(NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN))
    }

    pub fn last_day(&self) -> DayBucket {
        self.offset(1).first_day().offset(-1)
    }

    /// Every day of the month, in order
    pub fn days(&self) -> impl Iterator<Item = DayBucket> {
        let first = self.first_day();
        let len = self.last_day().days_since(first) + 1;
        (0..len).map(move |i| first.offset(i))
    }

    pub fn contains(&self, day: DayBucket) -> bool {
        day.month() == *self
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthBucket {
    type Err = InvalidBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || InvalidBucket::new("month", s);
        if s.len() != 7 {
            return Err(err());
        }
        let (year, month) = s.split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl From<MonthBucket> for String {
    fn from(month: MonthBucket) -> Self {
        month.to_string()
    }
}

impl TryFrom<String> for MonthBucket {
    type Error = InvalidBucket;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// BucketZone
// ============================================================================

/// The one timezone in which every bucket is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketZone {
    tz: Tz,
}

impl BucketZone {
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub const fn utc() -> Self {
        Self { tz: chrono_tz::UTC }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Local calendar date of an instant
    pub fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }

    pub fn day_of(&self, ts: DateTime<Utc>) -> DayBucket {
        DayBucket(self.date_of(ts))
    }

    pub fn month_of(&self, ts: DateTime<Utc>) -> MonthBucket {
        self.day_of(ts).month()
    }

    /// Today's bucket in this zone
    pub fn today(&self) -> DayBucket {
        self.day_of(Utc::now())
    }

    /// UTC instant at which `day` begins in this zone
    ///
    /// DST gap fallback: a non-existent local midnight falls back to UTC.
    pub fn day_start(&self, day: DayBucket) -> DateTime<Utc> {
        let naive = day.date().and_time(chrono::NaiveTime::MIN);
        naive
            .and_local_timezone(self.tz)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }
}

impl Default for BucketZone {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl FromStr for BucketZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|e| format!("invalid timezone '{}': {}", s, e))
    }
}
