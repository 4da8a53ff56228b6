//! Canonical retention policy types
//!
//! A policy has two parts. The minimum-retention spec keeps snapshots
//! unconditionally; the tier spec keeps one representative snapshot per
//! calendar period for each configured unit. Both are closed enums, built
//! once by the normalizer and never re-validated during retention.

use std::collections::BTreeMap;

use chrono::{Duration, Months, NaiveDateTime};

/// Calendar granularity shared by durations, tiers and bucketing
///
/// The derived ordering (hour < day < week < month < year) is the order in
/// which tier units are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl PeriodUnit {
    /// Every unit in evaluation order
    pub const ALL: [PeriodUnit; 5] = [
        PeriodUnit::Hour,
        PeriodUnit::Day,
        PeriodUnit::Week,
        PeriodUnit::Month,
        PeriodUnit::Year,
    ];

    /// Parse a unit name; singular and plural spellings are accepted
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hours" | "hourly" => Some(PeriodUnit::Hour),
            "day" | "days" | "daily" => Some(PeriodUnit::Day),
            "week" | "weeks" | "weekly" => Some(PeriodUnit::Week),
            "month" | "months" | "monthly" => Some(PeriodUnit::Month),
            "year" | "years" | "yearly" => Some(PeriodUnit::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodUnit::Hour => "hour",
            PeriodUnit::Day => "day",
            PeriodUnit::Week => "week",
            PeriodUnit::Month => "month",
            PeriodUnit::Year => "year",
        }
    }

    /// `instant - amount * unit`, or `None` if that falls outside the
    /// representable calendar
    ///
    /// Months and years are calendar months: the day is clamped to the end of
    /// the resulting month.
    pub fn subtract_from(&self, instant: &NaiveDateTime, amount: u32) -> Option<NaiveDateTime> {
        let amount_i64 = i64::from(amount);
        match self {
            PeriodUnit::Hour => instant.checked_sub_signed(Duration::hours(amount_i64)),
            PeriodUnit::Day => instant.checked_sub_signed(Duration::days(amount_i64)),
            PeriodUnit::Week => instant.checked_sub_signed(Duration::weeks(amount_i64)),
            PeriodUnit::Month => instant.checked_sub_months(Months::new(amount)),
            PeriodUnit::Year => amount
                .checked_mul(12)
                .and_then(|months| instant.checked_sub_months(Months::new(months))),
        }
    }
}

impl std::fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a snapshot taken at `timestamp` is outside `amount * unit` of `now`
///
/// Expired iff the window start is strictly after the timestamp, so a
/// snapshot exactly on the boundary, or in the future, is not expired. A
/// window reaching past the representable calendar expires nothing.
pub fn is_expired(
    timestamp: &NaiveDateTime,
    now: &NaiveDateTime,
    unit: PeriodUnit,
    amount: u32,
) -> bool {
    match unit.subtract_from(now, amount) {
        Some(window_start) => window_start > *timestamp,
        None => false,
    }
}

/// Minimum-retention rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionMinSpec {
    /// Keep every managed snapshot
    #[default]
    All,
    /// Keep only the newest managed snapshot
    Latest,
    /// Keep nothing unconditionally
    None,
    /// Keep every snapshot within `amount * unit` of now
    Duration { unit: PeriodUnit, amount: u32 },
}

/// How far back one tier unit reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierAmount {
    /// Periods within `n * unit` of now
    Count(u32),
    /// Every period, however old
    Unlimited,
}

/// Tiered-preserve rule: unit to amount, evaluated in unit order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetentionTierSpec {
    tiers: BTreeMap<PeriodUnit, TierAmount>,
}

impl RetentionTierSpec {
    /// Empty tier spec (no tiered retention)
    pub fn none() -> Self {
        Self::default()
    }

    /// Add or replace the amount for a unit
    pub fn with(mut self, unit: PeriodUnit, amount: TierAmount) -> Self {
        self.tiers.insert(unit, amount);
        self
    }

    pub fn get(&self, unit: PeriodUnit) -> Option<TierAmount> {
        self.tiers.get(&unit).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Configured units in hour, day, week, month, year order
    pub fn iter(&self) -> impl Iterator<Item = (PeriodUnit, TierAmount)> + '_ {
        self.tiers.iter().map(|(unit, amount)| (*unit, *amount))
    }
}

/// Complete retention policy for one dataset or target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    pub min: RetentionMinSpec,
    pub tier: RetentionTierSpec,
}

impl RetentionPolicy {
    pub fn new(min: RetentionMinSpec, tier: RetentionTierSpec) -> Self {
        Self { min, tier }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_unit_parse_accepts_plurals() {
        assert_eq!(PeriodUnit::parse("days"), Some(PeriodUnit::Day));
        assert_eq!(PeriodUnit::parse("Week"), Some(PeriodUnit::Week));
        assert_eq!(PeriodUnit::parse("yearly"), Some(PeriodUnit::Year));
        assert_eq!(PeriodUnit::parse("fortnight"), None);
    }

    #[test]
    fn test_subtract_calendar_months_clamps_day() {
        let now = at(2024, 3, 31, 12);
        assert_eq!(
            PeriodUnit::Month.subtract_from(&now, 1),
            Some(at(2024, 2, 29, 12))
        );
        assert_eq!(
            PeriodUnit::Year.subtract_from(&now, 1),
            Some(at(2023, 3, 31, 12))
        );
    }

    #[test]
    fn test_expiry_boundary_is_not_expired() {
        let now = at(2024, 1, 5, 0);
        assert!(!is_expired(&at(2024, 1, 2, 0), &now, PeriodUnit::Day, 3));
        assert!(is_expired(&at(2024, 1, 1, 23), &now, PeriodUnit::Day, 3));
        assert!(!is_expired(&at(2024, 2, 1, 0), &now, PeriodUnit::Day, 3));
    }

    #[test]
    fn test_tier_spec_iterates_in_unit_order() {
        let tier = RetentionTierSpec::none()
            .with(PeriodUnit::Year, TierAmount::Unlimited)
            .with(PeriodUnit::Hour, TierAmount::Count(24))
            .with(PeriodUnit::Week, TierAmount::Count(4));

        let units: Vec<PeriodUnit> = tier.iter().map(|(u, _)| u).collect();
        assert_eq!(
            units,
            vec![PeriodUnit::Hour, PeriodUnit::Week, PeriodUnit::Year]
        );
        assert_eq!(tier.get(PeriodUnit::Day), None);
    }

    #[test]
    fn test_default_policy_keeps_all() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.min, RetentionMinSpec::All);
        assert!(policy.tier.is_empty());
    }
}
