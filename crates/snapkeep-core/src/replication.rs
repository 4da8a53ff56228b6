//! Replication planner
//!
//! Decides whether a snapshot should be sent to a target and from which
//! incremental base. The decision simulates the target's own retention: a
//! snapshot the target would destroy on its next pass is not worth sending.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::naming::{suffix_of, NamingScheme, SNAPSHOT_SEPARATOR};
use crate::period::PeriodOffsets;
use crate::policy::RetentionPolicy;
use crate::retention::apply_retention;

/// Outcome of planning one snapshot for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationPlan {
    /// Name the snapshot would have on the target
    pub target_name: String,
    /// Source-side snapshot to send incrementally from; `None` means a full send
    pub incremental_base: Option<String>,
    pub should_transfer: bool,
}

/// What the planner needs to know about a target
#[derive(Debug, Clone, Copy)]
pub struct TargetState<'a> {
    pub dataset: &'a str,
    /// Managed snapshot names currently on the target
    pub managed: &'a [String],
    pub policy: &'a RetentionPolicy,
}

/// Latest snapshot present on both sides, as a source-side name
///
/// Snapshots are matched by suffix, so dataset paths do not need to agree.
pub fn find_incremental_base<S, T>(source_kept: &[S], target_managed: &[T]) -> Option<String>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let on_target: BTreeSet<&str> = target_managed
        .iter()
        .filter_map(|name| suffix_of(name.as_ref()))
        .collect();

    source_kept
        .iter()
        .filter_map(|name| {
            let name: &str = name.as_ref();
            suffix_of(name).map(|suffix| (suffix, name))
        })
        .filter(|(suffix, _)| on_target.contains(suffix))
        .max_by_key(|(suffix, _)| *suffix)
        .map(|(_, name)| name.to_string())
}

/// Whether the target would keep `candidate_target_name` if it arrived now
pub fn would_retain_if_sent(
    candidate_target_name: &str,
    target: &TargetState<'_>,
    naming: &NamingScheme,
    offsets: &PeriodOffsets,
    now: NaiveDateTime,
) -> bool {
    let hypothetical = target
        .managed
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(candidate_target_name));

    apply_retention(hypothetical, naming, target.policy, offsets, now).is_kept(candidate_target_name)
}

/// Plan sending `candidate` (a source snapshot name) to a target
///
/// No transfer is planned when the target already holds the snapshot, or
/// when the target's own policy would discard it straight away.
pub fn plan_transfer<S>(
    candidate: &str,
    source_kept: &[S],
    target: &TargetState<'_>,
    naming: &NamingScheme,
    offsets: &PeriodOffsets,
    now: NaiveDateTime,
) -> ReplicationPlan
where
    S: AsRef<str>,
{
    let suffix = suffix_of(candidate).unwrap_or(candidate);
    let target_name = format!("{}{}{}", target.dataset, SNAPSHOT_SEPARATOR, suffix);

    let already_present = target.managed.iter().any(|name| *name == target_name);
    if already_present || !would_retain_if_sent(&target_name, target, naming, offsets, now) {
        return ReplicationPlan {
            target_name,
            incremental_base: None,
            should_transfer: false,
        };
    }

    ReplicationPlan {
        target_name,
        incremental_base: find_incremental_base(source_kept, target.managed),
        should_transfer: true,
    }
}
