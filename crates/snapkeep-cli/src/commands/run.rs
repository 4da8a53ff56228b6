//! Run command

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Args;
use snapkeep_engine::commands::run::execute as execute_pass;
use snapkeep_engine::config::loader::{load_config, DEFAULT_CONFIG_PATH};
use snapkeep_engine::context::current_minute;
use snapkeep_engine::report::{DatasetReport, RunReport, TargetReport, TransferOutcome};
use snapkeep_engine::RunContext;
use snapkeep_store::ZfsCli;

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Decide and log every action without changing any dataset
    #[arg(long)]
    pub dry_run: bool,

    /// Never destroy snapshots
    #[arg(long)]
    pub safe: bool,

    /// Pass instant as YYYY-MM-DDTHH:MM (defaults to the current minute)
    #[arg(long, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    #[arg(long, default_value = "zfs")]
    pub zfs_bin: PathBuf,
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM: {}", e))
}

pub fn execute(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    let store = ZfsCli::with_binary(&args.zfs_bin);
    let ctx = RunContext::new(args.now.unwrap_or_else(current_minute))
        .with_dry_run(args.dry_run)
        .with_safe_mode(args.safe);

    let report = execute_pass(&ctx, &store, &config);
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    let mode = match (report.dry_run, report.safe_mode) {
        (true, _) => " (dry run)",
        (false, true) => " (safe mode)",
        (false, false) => "",
    };
    println!("Run {} at {}{}", report.run_id, report.now, mode);

    for dataset in &report.datasets {
        print_dataset(dataset);
    }

    println!(
        "{} dataset(s), {} failure(s)",
        report.datasets.len(),
        report.failure_count()
    );
}

fn print_dataset(dataset: &DatasetReport) {
    match &dataset.error {
        Some(e) => println!("  {}: FAILED at {:?}: {}", dataset.dataset, dataset.stage, e),
        None => println!(
            "  {}: kept {}, destroyed {}, suppressed {}",
            dataset.dataset,
            dataset.keep.len(),
            dataset.destroy.destroyed.len(),
            dataset.destroy.suppressed.len()
        ),
    }
    for failure in &dataset.destroy.failed {
        println!("    destroy failed: {}", failure);
    }
    for target in &dataset.targets {
        print_target(target);
    }
}

fn print_target(target: &TargetReport) {
    if let Some(e) = &target.error {
        println!("    -> {}: FAILED at {:?}: {}", target.target, target.stage, e);
        return;
    }
    let transfer = match &target.transfer {
        TransferOutcome::Sent {
            target_name,
            incremental_base: Some(base),
        } => format!("sent {} from {}", target_name, base),
        TransferOutcome::Sent {
            target_name,
            incremental_base: None,
        } => format!("sent {} (full)", target_name),
        TransferOutcome::AlreadyPresent => "already present".to_string(),
        TransferOutcome::NotRetained => "skipped, target policy would discard it".to_string(),
        TransferOutcome::NoCandidate => "skipped, snapshot not kept on source".to_string(),
        TransferOutcome::NotAttempted => "not attempted".to_string(),
    };
    println!(
        "    -> {}: {}; kept {}, destroyed {}, suppressed {}",
        target.target,
        transfer,
        target.keep.len(),
        target.destroy.destroyed.len(),
        target.destroy.suppressed.len()
    );
    for failure in &target.destroy.failed {
        println!("       destroy failed: {}", failure);
    }
}
