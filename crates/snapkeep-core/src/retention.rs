//! Retention engine
//!
//! Computes which managed snapshots of one dataset to keep and which to
//! destroy at a given instant. Two rules are unioned:
//!
//! - the minimum-retention spec keeps snapshots unconditionally
//!   (all, the newest one, none, or everything inside a duration);
//! - the tier spec keeps, for each configured unit, the oldest snapshot of
//!   every calendar period that falls inside that unit's window.
//!
//! Names that are not managed under the naming scheme never appear in
//! either output.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::naming::NamingScheme;
use crate::period::{bucket_key, BucketKey, PeriodOffsets};
use crate::policy::{is_expired, RetentionMinSpec, RetentionPolicy, TierAmount};

/// Keep/destroy partition of the managed snapshots
///
/// Both sequences are sorted by name, which is chronological for
/// fixed-width timestamp formats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetentionResult {
    pub keep: Vec<String>,
    pub destroy: Vec<String>,
}

impl RetentionResult {
    pub fn is_kept(&self, name: &str) -> bool {
        self.keep.iter().any(|kept| kept == name)
    }
}

#[derive(Debug)]
struct Managed<'a> {
    name: &'a str,
    timestamp: NaiveDateTime,
}

/// Apply a retention policy to a set of snapshot names
pub fn apply_retention<I, S>(
    names: I,
    naming: &NamingScheme,
    policy: &RetentionPolicy,
    offsets: &PeriodOffsets,
    now: NaiveDateTime,
) -> RetentionResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();

    let mut managed: Vec<Managed<'_>> = unique
        .iter()
        .filter_map(|name| {
            naming.parse(name).map(|timestamp| Managed {
                name: name.as_str(),
                timestamp,
            })
        })
        .collect();

    // Newest first; the tier pass relies on this for its take-while
    managed.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.name.cmp(a.name))
    });

    let mut keep: BTreeSet<&str> = preserved_by_min(&managed, policy.min, &now);
    keep.extend(preserved_by_policy(&managed, policy, offsets, &now));

    let destroy: Vec<String> = managed
        .iter()
        .filter(|snapshot| !keep.contains(snapshot.name))
        .map(|snapshot| snapshot.name.to_string())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    RetentionResult {
        keep: keep.into_iter().map(str::to_string).collect(),
        destroy,
    }
}

fn preserved_by_min<'a>(
    newest_first: &[Managed<'a>],
    min: RetentionMinSpec,
    now: &NaiveDateTime,
) -> BTreeSet<&'a str> {
    match min {
        RetentionMinSpec::All => newest_first.iter().map(|s| s.name).collect(),
        RetentionMinSpec::Latest => newest_first.first().map(|s| s.name).into_iter().collect(),
        RetentionMinSpec::None => BTreeSet::new(),
        RetentionMinSpec::Duration { unit, amount } => newest_first
            .iter()
            .filter(|s| !is_expired(&s.timestamp, now, unit, amount))
            .map(|s| s.name)
            .collect(),
    }
}

fn preserved_by_policy<'a>(
    newest_first: &[Managed<'a>],
    policy: &RetentionPolicy,
    offsets: &PeriodOffsets,
    now: &NaiveDateTime,
) -> BTreeSet<&'a str> {
    let mut preserved = BTreeSet::new();
    if policy.min == RetentionMinSpec::All || policy.tier.is_empty() {
        return preserved;
    }

    for (unit, amount) in policy.tier.iter() {
        let pool: &[Managed<'a>] = match amount {
            TierAmount::Unlimited => newest_first,
            TierAmount::Count(0) => &[],
            TierAmount::Count(n) => {
                let live = newest_first
                    .iter()
                    .take_while(|s| !is_expired(&s.timestamp, now, unit, n))
                    .count();
                &newest_first[..live]
            }
        };

        // Oldest snapshot per period; the pool is newest first, so the last
        // one seen for a key wins
        let mut oldest: BTreeMap<BucketKey, &Managed<'a>> = BTreeMap::new();
        for snapshot in pool {
            oldest.insert(bucket_key(&snapshot.timestamp, unit, offsets), snapshot);
        }
        preserved.extend(oldest.values().map(|s| s.name));
    }

    preserved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PeriodUnit, RetentionTierSpec};
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn scheme() -> NamingScheme {
        NamingScheme::with_prefix("test_").unwrap()
    }

    fn names(stamps: &[&str]) -> Vec<String> {
        stamps.iter().map(|s| format!("tank@test_{}", s)).collect()
    }

    #[test]
    fn test_empty_input() {
        let result = apply_retention(
            Vec::<String>::new(),
            &scheme(),
            &RetentionPolicy::new(RetentionMinSpec::None, RetentionTierSpec::none()),
            &PeriodOffsets::default(),
            at(2024, 1, 1, 0),
        );
        assert!(result.keep.is_empty());
        assert!(result.destroy.is_empty());
    }

    #[test]
    fn test_latest_keeps_newest_only() {
        let input = names(&["2024-01-01_00-00", "2024-01-03_00-00", "2024-01-02_00-00"]);
        let result = apply_retention(
            &input,
            &scheme(),
            &RetentionPolicy::new(RetentionMinSpec::Latest, RetentionTierSpec::none()),
            &PeriodOffsets::default(),
            at(2024, 1, 5, 0),
        );
        assert_eq!(result.keep, names(&["2024-01-03_00-00"]));
        assert_eq!(
            result.destroy,
            names(&["2024-01-01_00-00", "2024-01-02_00-00"])
        );
    }

    #[test]
    fn test_tier_keeps_oldest_in_bucket() {
        let input = names(&["2024-01-01_00-00", "2024-01-01_12-00", "2024-01-02_00-00"]);
        let policy = RetentionPolicy::new(
            RetentionMinSpec::None,
            RetentionTierSpec::none().with(PeriodUnit::Day, TierAmount::Count(1)),
        );
        let result = apply_retention(
            &input,
            &scheme(),
            &policy,
            &PeriodOffsets::default(),
            at(2024, 1, 2, 0),
        );

        assert!(result.is_kept("tank@test_2024-01-01_00-00"));
        assert!(!result.is_kept("tank@test_2024-01-01_12-00"));
    }

    #[test]
    fn test_zero_tier_amount_keeps_nothing() {
        let input = names(&["2024-01-05_00-00"]);
        let policy = RetentionPolicy::new(
            RetentionMinSpec::None,
            RetentionTierSpec::none().with(PeriodUnit::Day, TierAmount::Count(0)),
        );
        let result = apply_retention(
            &input,
            &scheme(),
            &policy,
            &PeriodOffsets::default(),
            at(2024, 1, 5, 0),
        );
        assert!(result.keep.is_empty());
        assert_eq!(result.destroy, input);
    }

    #[test]
    fn test_take_while_stops_at_first_expired() {
        let input = names(&["2024-01-01_00-00", "2024-01-04_00-00", "2024-01-04_12-00"]);
        let policy = RetentionPolicy::new(
            RetentionMinSpec::None,
            RetentionTierSpec::none().with(PeriodUnit::Day, TierAmount::Count(2)),
        );
        let result = apply_retention(
            &input,
            &scheme(),
            &policy,
            &PeriodOffsets::default(),
            at(2024, 1, 5, 0),
        );
        assert_eq!(result.keep, names(&["2024-01-04_00-00"]));
    }

    #[test]
    fn test_duplicate_names_are_counted_once() {
        let input = names(&["2024-01-01_00-00", "2024-01-01_00-00"]);
        let result = apply_retention(
            &input,
            &scheme(),
            &RetentionPolicy::new(RetentionMinSpec::None, RetentionTierSpec::none()),
            &PeriodOffsets::default(),
            at(2024, 1, 5, 0),
        );
        assert_eq!(result.destroy, names(&["2024-01-01_00-00"]));
    }
}
