//! Calendar period bucketing
//!
//! Maps a timestamp to the retention period it belongs to for a unit. The
//! offsets move where periods begin: with `hour_start = 6` a day runs from
//! 06:00 to 05:59 the next morning, and that shifted day is what weeks,
//! months and years are built from.
//!
//! Adjustments apply in a fixed order:
//! 1. day adjustment (every unit but hour): before `hour_start` counts as
//!    the previous day;
//! 2. month adjustment (month, year): a week-of-month below
//!    `week_of_month_start` counts as the previous month;
//! 3. year adjustment (year): a month below `month_of_year_start` counts as
//!    the previous year.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Timelike};

use crate::policy::PeriodUnit;

/// Where periods begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodOffsets {
    /// Hour of day a day starts at (0-23)
    pub hour_start: u32,
    /// Weekday a week starts on (1 = Monday .. 7 = Sunday)
    pub day_of_week_start: u32,
    /// Week of month a month starts at (1-4)
    pub week_of_month_start: u32,
    /// Month a year starts at (1-12)
    pub month_of_year_start: u32,
}

impl Default for PeriodOffsets {
    fn default() -> Self {
        Self {
            hour_start: 0,
            day_of_week_start: 7,
            week_of_month_start: 1,
            month_of_year_start: 1,
        }
    }
}

/// Opaque, totally ordered period identifier
///
/// Two timestamps share a key iff they fall in the same period of the same
/// unit. Fields a unit does not use are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey(i32, u32, u32, u32);

/// 1-based week of month, `ceil(day / 7)`
pub fn week_of_month(date: &NaiveDate) -> u32 {
    date.day().div_ceil(7)
}

fn day_adjusted(timestamp: &NaiveDateTime, offsets: &PeriodOffsets) -> NaiveDate {
    let date = timestamp.date();
    if timestamp.hour() < offsets.hour_start {
        date.pred_opt().unwrap_or(date)
    } else {
        date
    }
}

fn month_adjusted(date: NaiveDate, offsets: &PeriodOffsets) -> NaiveDate {
    if week_of_month(&date) < offsets.week_of_month_start {
        date.checked_sub_months(Months::new(1)).unwrap_or(date)
    } else {
        date
    }
}

/// Bucket key of a timestamp for a unit under the given offsets
pub fn bucket_key(timestamp: &NaiveDateTime, unit: PeriodUnit, offsets: &PeriodOffsets) -> BucketKey {
    match unit {
        PeriodUnit::Hour => BucketKey(
            timestamp.year(),
            timestamp.month(),
            timestamp.day(),
            timestamp.hour(),
        ),
        PeriodUnit::Day => {
            let day = day_adjusted(timestamp, offsets);
            BucketKey(day.year(), day.month(), day.day(), 0)
        }
        PeriodUnit::Week => {
            let day = day_adjusted(timestamp, offsets);
            let weekday = i64::from(day.weekday().number_from_monday());
            let start = i64::from(offsets.day_of_week_start);
            let days_back = ((weekday - start) % 7 + 7) % 7;
            let week_start = day
                .checked_sub_days(Days::new(days_back.unsigned_abs()))
                .unwrap_or(day);
            BucketKey(week_start.year(), week_start.month(), week_start.day(), 0)
        }
        PeriodUnit::Month => {
            let month = month_adjusted(day_adjusted(timestamp, offsets), offsets);
            BucketKey(month.year(), month.month(), week_of_month(&month), 0)
        }
        PeriodUnit::Year => {
            let month = month_adjusted(day_adjusted(timestamp, offsets), offsets);
            let year = if month.month() < offsets.month_of_year_start {
                month.year() - 1
            } else {
                month.year()
            };
            BucketKey(year, 0, 0, 0)
        }
    }
}
