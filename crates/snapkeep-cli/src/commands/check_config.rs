//! Configuration check command

use std::path::PathBuf;

use clap::Args;
use snapkeep_core::{DatasetSettings, RetentionPolicy, TargetSettings};
use snapkeep_engine::config::loader::{load_config, DEFAULT_CONFIG_PATH};
use snapkeep_engine::config::resolve_config;

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

pub fn execute(args: CheckConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    let entries = resolve_config(&config);

    let mut invalid = 0usize;
    for entry in &entries {
        match &entry.settings {
            Ok(settings) => println!("{}: {}", entry.path, describe_dataset(settings)),
            Err(e) => {
                invalid += 1;
                println!("{}: INVALID: {}", entry.path, e);
            }
        }
        for target in &entry.targets {
            match &target.settings {
                Ok(settings) => println!("  -> {}: {}", target.path, describe_target(settings)),
                Err(e) => {
                    invalid += 1;
                    println!("  -> {}: INVALID: {}", target.path, e);
                }
            }
        }
    }

    if invalid > 0 {
        return Err(format!("{} invalid item(s) in {}", invalid, args.config.display()).into());
    }
    println!("{} dataset(s) OK", entries.len());
    Ok(())
}

fn describe_policy(policy: &RetentionPolicy) -> String {
    let tiers: Vec<String> = policy
        .tier
        .iter()
        .map(|(unit, amount)| format!("{}={:?}", unit, amount))
        .collect();
    format!("preserve_min={:?} preserve=[{}]", policy.min, tiers.join(", "))
}

fn describe_dataset(settings: &DatasetSettings) -> String {
    format!(
        "prefix={} format={} recursive={} hour_start={} day_of_week_start={} \
         week_of_month_start={} month_of_year_start={} {}",
        settings.naming.prefix(),
        settings.naming.timestamp_format(),
        settings.recursive,
        settings.offsets.hour_start,
        settings.offsets.day_of_week_start,
        settings.offsets.week_of_month_start,
        settings.offsets.month_of_year_start,
        describe_policy(&settings.policy)
    )
}

fn describe_target(settings: &TargetSettings) -> String {
    describe_policy(&settings.policy)
}
