//! One retention and replication pass.
//!
//! ## Per dataset (in order):
//! 1. Create `<dataset>@<prefix><now>` (no-op if present)
//! 2. Enumerate the dataset
//! 3. Apply the dataset's retention policy
//! 4. Destroy everything not kept
//! 5. Process each target against the kept set
//!
//! ## Per target (in order):
//! 1. Enumerate the target
//! 2. Choose the candidate and incremental base
//! 3. Decide whether to transfer, simulating the target's retention
//! 4. Transfer if indicated
//! 5. Apply the target's retention policy to its updated set
//! 6. Destroy everything not kept
//!
//! A failure stops only the dataset or target it happened on. Failed
//! destroys are recorded one by one and do not stop the remaining steps.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use snapkeep_core::errors::ExError;
use snapkeep_core::replication::plan_transfer;
use snapkeep_core::{
    apply_retention, log_op_end, log_op_error, log_op_start, DatasetSettings, TargetSettings,
    TargetState,
};
use snapkeep_store::SnapshotStore;

use crate::cache::SnapshotCache;
use crate::config::{resolve_config, ConfigFile, DatasetEntry, TargetEntry};
use crate::context::RunContext;
use crate::report::{
    DatasetReport, DatasetStage, DestroyOutcome, RunReport, TargetReport, TargetStage,
    TransferOutcome,
};

/// Resolve a configuration and run one pass over it
pub fn execute(ctx: &RunContext, store: &dyn SnapshotStore, config: &ConfigFile) -> RunReport {
    let entries = resolve_config(config);
    let mut cache = SnapshotCache::new();
    run_pass(ctx, store, &entries, &mut cache)
}

/// Run one pass over already resolved entries, in order
pub fn run_pass(
    ctx: &RunContext,
    store: &dyn SnapshotStore,
    entries: &[DatasetEntry],
    cache: &mut SnapshotCache,
) -> RunReport {
    let start = Instant::now();
    log_op_start!(
        "run_pass",
        run_id = %ctx.run_id,
        now = %ctx.now,
        dry_run = ctx.dry_run,
        safe_mode = ctx.safe_mode,
        datasets = entries.len()
    );

    let mut datasets = Vec::with_capacity(entries.len());
    for entry in entries {
        datasets.push(process_dataset(ctx, store, cache, entry));
    }

    let report = RunReport {
        run_id: ctx.run_id.clone(),
        now: ctx.now,
        dry_run: ctx.dry_run,
        safe_mode: ctx.safe_mode,
        datasets,
    };

    log_op_end!(
        "run_pass",
        duration_ms = start.elapsed().as_millis() as u64,
        run_id = %ctx.run_id,
        failures = report.failure_count()
    );
    report
}

fn process_dataset(
    ctx: &RunContext,
    store: &dyn SnapshotStore,
    cache: &mut SnapshotCache,
    entry: &DatasetEntry,
) -> DatasetReport {
    let start = Instant::now();
    let mut report = DatasetReport::new(&entry.path);
    log_op_start!("process_dataset", run_id = %ctx.run_id, dataset = %entry.path);

    let result = match &entry.settings {
        Ok(settings) => dataset_steps(ctx, store, cache, settings, &entry.targets, &mut report),
        Err(e) => Err(e.clone()),
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(()) => {
            report.stage = DatasetStage::Done;
            log_op_end!(
                "process_dataset",
                duration_ms = duration_ms,
                run_id = %ctx.run_id,
                dataset = %entry.path,
                keep_len = report.keep.len(),
                destroy_len = report.destroy.destroyed.len()
            );
        }
        Err(e) => {
            log_op_error!(
                "process_dataset",
                e.clone(),
                duration_ms = duration_ms,
                run_id = %ctx.run_id,
                dataset = %entry.path,
                stage = ?report.stage
            );
            report.error = Some(e);
        }
    }
    report
}

fn dataset_steps(
    ctx: &RunContext,
    store: &dyn SnapshotStore,
    cache: &mut SnapshotCache,
    settings: &DatasetSettings,
    targets: &[TargetEntry],
    report: &mut DatasetReport,
) -> Result<(), ExError> {
    let created = settings.naming.snapshot_name(&settings.path, &ctx.now);
    let suffix = settings.naming.suffix(&ctx.now);

    if ctx.allows_mutation() {
        store.create(&settings.path, &created, settings.recursive)?;
        tracing::info!(run_id = %ctx.run_id, snapshot = %created, "snapshot created");
    } else {
        tracing::info!(run_id = %ctx.run_id, snapshot = %created, "dry run: would create snapshot");
    }
    cache.record_created(&settings.path, &suffix, settings.recursive);
    report.created = Some(created.clone());
    report.stage = DatasetStage::Created;

    let current = cache.snapshots(store, &settings.path)?.clone();
    report.stage = DatasetStage::Enumerated;

    let retention = apply_retention(
        &current,
        &settings.naming,
        &settings.policy,
        &settings.offsets,
        ctx.now,
    );
    tracing::debug!(
        run_id = %ctx.run_id,
        dataset = %settings.path,
        keep_len = retention.keep.len(),
        destroy_len = retention.destroy.len(),
        "retention applied"
    );
    report.stage = DatasetStage::RetentionApplied;

    report.destroy = destroy_all(ctx, store, cache, &retention.destroy);
    report.keep = retention.keep;
    report.stage = DatasetStage::Destroyed;

    for target in targets {
        let outcome = process_target(ctx, store, cache, settings, &created, &report.keep, target);
        report.targets.push(outcome);
    }
    Ok(())
}

fn destroy_all(
    ctx: &RunContext,
    store: &dyn SnapshotStore,
    cache: &mut SnapshotCache,
    names: &[String],
) -> DestroyOutcome {
    let mut outcome = DestroyOutcome::default();
    for name in names {
        if ctx.safe_mode && !ctx.dry_run {
            tracing::info!(run_id = %ctx.run_id, snapshot = %name, "safe mode: destroy suppressed");
            outcome.suppressed.push(name.clone());
            continue;
        }
        if ctx.allows_destroy() {
            let start = Instant::now();
            if let Err(e) = store.destroy(name) {
                log_op_error!(
                    "destroy_snapshot",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    run_id = %ctx.run_id,
                    snapshot = %name
                );
                outcome.failed.push(e);
                continue;
            }
            tracing::info!(run_id = %ctx.run_id, snapshot = %name, "snapshot destroyed");
        } else {
            tracing::info!(run_id = %ctx.run_id, snapshot = %name, "dry run: would destroy snapshot");
        }
        cache.record_destroyed(name);
        outcome.destroyed.push(name.clone());
    }
    outcome
}

fn process_target(
    ctx: &RunContext,
    store: &dyn SnapshotStore,
    cache: &mut SnapshotCache,
    source: &DatasetSettings,
    created: &str,
    source_keep: &[String],
    entry: &TargetEntry,
) -> TargetReport {
    let start = Instant::now();
    let mut report = TargetReport::new(&entry.path);
    log_op_start!(
        "process_target",
        run_id = %ctx.run_id,
        dataset = %source.path,
        target = %entry.path
    );

    let result = match &entry.settings {
        Ok(settings) => target_steps(
            ctx,
            store,
            cache,
            source,
            settings,
            created,
            source_keep,
            &mut report,
        )
        .map_err(|e| e.with_target(entry.path.as_str())),
        Err(e) => Err(e.clone()),
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(()) => {
            report.stage = TargetStage::Done;
            log_op_end!(
                "process_target",
                duration_ms = duration_ms,
                run_id = %ctx.run_id,
                dataset = %source.path,
                target = %entry.path,
                keep_len = report.keep.len(),
                destroy_len = report.destroy.destroyed.len()
            );
        }
        Err(e) => {
            log_op_error!(
                "process_target",
                e.clone(),
                duration_ms = duration_ms,
                run_id = %ctx.run_id,
                dataset = %source.path,
                target = %entry.path,
                stage = ?report.stage
            );
            report.error = Some(e);
        }
    }
    report
}

#[allow(clippy::too_many_arguments)]
fn target_steps(
    ctx: &RunContext,
    store: &dyn SnapshotStore,
    cache: &mut SnapshotCache,
    source: &DatasetSettings,
    target: &TargetSettings,
    created: &str,
    source_keep: &[String],
    report: &mut TargetReport,
) -> Result<(), ExError> {
    let managed: Vec<String> = cache
        .target_snapshots(store, &target.path)?
        .iter()
        .filter(|name| source.naming.parse(name).is_some())
        .cloned()
        .collect();
    report.stage = TargetStage::Enumerated;

    let candidate = source_keep.iter().find(|name| name.as_str() == created);
    let plan = candidate.map(|candidate| {
        let state = TargetState {
            dataset: &target.path,
            managed: &managed,
            policy: &target.policy,
        };
        plan_transfer(
            candidate,
            source_keep,
            &state,
            &source.naming,
            &source.offsets,
            ctx.now,
        )
    });
    report.stage = TargetStage::BaseChosen;

    report.transfer = match &plan {
        None => TransferOutcome::NoCandidate,
        Some(plan) if plan.should_transfer => TransferOutcome::Sent {
            target_name: plan.target_name.clone(),
            incremental_base: plan.incremental_base.clone(),
        },
        Some(plan) if managed.contains(&plan.target_name) => TransferOutcome::AlreadyPresent,
        Some(_) => TransferOutcome::NotRetained,
    };
    report.stage = TargetStage::TransferDecided;

    if let Some(plan) = plan.filter(|p| p.should_transfer) {
        if ctx.allows_mutation() {
            store.transfer(created, &target.path, plan.incremental_base.as_deref())?;
            tracing::info!(
                run_id = %ctx.run_id,
                snapshot = %created,
                target = %target.path,
                incremental_base = ?plan.incremental_base,
                "snapshot transferred"
            );
        } else {
            tracing::info!(
                run_id = %ctx.run_id,
                snapshot = %created,
                target = %target.path,
                incremental_base = ?plan.incremental_base,
                "dry run: would transfer snapshot"
            );
        }
        cache.record_transferred(&plan.target_name);
        report.stage = TargetStage::Transferred;
    }

    let updated = cache.target_snapshots(store, &target.path)?.clone();
    let retention = apply_retention(
        &updated,
        &source.naming,
        &target.policy,
        &source.offsets,
        ctx.now,
    );
    report.stage = TargetStage::RetentionApplied;

    report.destroy = destroy_all(ctx, store, cache, &retention.destroy);
    report.keep = retention.keep;
    report.stage = TargetStage::Destroyed;
    Ok(())
}
