#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime};
use common::{at, test_scheme};
use proptest::prelude::*;
use snapkeep_core::{
    apply_retention, PeriodOffsets, PeriodUnit, RetentionMinSpec, RetentionPolicy,
    RetentionTierSpec, TierAmount,
};

fn epoch() -> NaiveDateTime {
    at(2023, 1, 1, 0, 0)
}

fn now() -> NaiveDateTime {
    at(2025, 1, 1, 0, 0)
}

/// Managed names spread over two years, minute precision
fn managed_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(0i64..(2 * 365 * 24 * 60), 0..40).prop_map(|minutes| {
        let scheme = test_scheme();
        minutes
            .into_iter()
            .map(|m| scheme.snapshot_name("tank", &(epoch() + Duration::minutes(m))))
            .collect()
    })
}

fn unit() -> impl Strategy<Value = PeriodUnit> {
    prop::sample::select(PeriodUnit::ALL.to_vec())
}

fn tier_amount() -> impl Strategy<Value = TierAmount> {
    prop_oneof![
        (0u32..30).prop_map(TierAmount::Count),
        Just(TierAmount::Unlimited),
    ]
}

fn min_spec() -> impl Strategy<Value = RetentionMinSpec> {
    prop_oneof![
        Just(RetentionMinSpec::All),
        Just(RetentionMinSpec::Latest),
        Just(RetentionMinSpec::None),
        (unit(), 1u32..20).prop_map(|(unit, amount)| RetentionMinSpec::Duration { unit, amount }),
    ]
}

fn policy() -> impl Strategy<Value = RetentionPolicy> {
    (
        min_spec(),
        prop::collection::vec((unit(), tier_amount()), 0..5),
    )
        .prop_map(|(min, tiers)| {
            let tier = tiers
                .into_iter()
                .fold(RetentionTierSpec::none(), |spec, (u, a)| spec.with(u, a));
            RetentionPolicy::new(min, tier)
        })
}

fn offsets() -> impl Strategy<Value = PeriodOffsets> {
    (0u32..24, 1u32..=7, 1u32..=4, 1u32..=12).prop_map(|(hour, dow, wom, moy)| PeriodOffsets {
        hour_start: hour,
        day_of_week_start: dow,
        week_of_month_start: wom,
        month_of_year_start: moy,
    })
}

proptest! {
    #[test]
    fn prop_keep_and_destroy_partition_managed(
        names in managed_names(),
        unmanaged in prop::collection::vec("[a-z]{1,8}", 0..5),
        policy in policy(),
        offsets in offsets(),
    ) {
        let mut input = names.clone();
        input.extend(unmanaged.iter().map(|n| format!("tank@{}", n)));

        let result = apply_retention(&input, &test_scheme(), &policy, &offsets, now());

        let keep: BTreeSet<&String> = result.keep.iter().collect();
        let destroy: BTreeSet<&String> = result.destroy.iter().collect();
        let managed: BTreeSet<&String> = names.iter().collect();

        prop_assert!(keep.is_disjoint(&destroy));
        let union: BTreeSet<&String> = keep.union(&destroy).copied().collect();
        prop_assert_eq!(union, managed);
    }

    #[test]
    fn prop_min_all_keeps_every_managed_name(
        names in managed_names(),
        offsets in offsets(),
    ) {
        let result = apply_retention(
            &names,
            &test_scheme(),
            &RetentionPolicy::default(),
            &offsets,
            now(),
        );
        let expected: BTreeSet<String> = names.into_iter().collect();
        prop_assert_eq!(result.keep, expected.into_iter().collect::<Vec<_>>());
        prop_assert!(result.destroy.is_empty());
    }

    #[test]
    fn prop_latest_without_tiers_keeps_only_newest(names in managed_names()) {
        let result = apply_retention(
            &names,
            &test_scheme(),
            &RetentionPolicy::new(RetentionMinSpec::Latest, RetentionTierSpec::none()),
            &PeriodOffsets::default(),
            now(),
        );
        // Default format is fixed width, so the greatest name is the newest
        let newest: Vec<String> = names.iter().max().cloned().into_iter().collect();
        prop_assert_eq!(result.keep, newest);
    }

    #[test]
    fn prop_none_without_tiers_destroys_all(names in managed_names()) {
        let result = apply_retention(
            &names,
            &test_scheme(),
            &RetentionPolicy::new(RetentionMinSpec::None, RetentionTierSpec::none()),
            &PeriodOffsets::default(),
            now(),
        );
        prop_assert!(result.keep.is_empty());
        prop_assert_eq!(result.destroy.len(), names.iter().collect::<BTreeSet<_>>().len());
    }

    #[test]
    fn prop_applying_retention_twice_is_stable(
        names in managed_names(),
        policy in policy(),
        offsets in offsets(),
    ) {
        let scheme = test_scheme();
        let first = apply_retention(&names, &scheme, &policy, &offsets, now());
        let second = apply_retention(&first.keep, &scheme, &policy, &offsets, now());

        prop_assert_eq!(&second.keep, &first.keep);
        prop_assert!(second.destroy.is_empty());
    }
}
