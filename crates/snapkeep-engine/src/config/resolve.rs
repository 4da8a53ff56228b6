//! Settings resolution
//!
//! Every dataset and target resolves independently. A failure on one item
//! is kept next to that item and never stops its siblings from resolving.

#![allow(clippy::result_large_err)]

use serde_json::Value;
use snapkeep_core::errors::ExError;
use snapkeep_core::naming::{validate_dataset_path, DEFAULT_TIMESTAMP_FORMAT};
use snapkeep_core::normalize::{
    normalize_day_of_week, normalize_hour_start, normalize_min, normalize_month_of_year,
    normalize_tier, normalize_week_of_month,
};
use snapkeep_core::settings::{resolve, DEFAULT_PREFIX, DEFAULT_RECURSIVE};
use snapkeep_core::{
    DatasetSettings, NamingScheme, PeriodOffsets, RetentionPolicy, TargetSettings,
};

use crate::config::format::{ConfigFile, RawDataset, RawDefaults, RawTarget};

/// A dataset as configured, resolved or with the reason it could not be
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub path: String,
    pub settings: Result<DatasetSettings, ExError>,
    pub targets: Vec<TargetEntry>,
}

/// A replication target as configured
#[derive(Debug, Clone)]
pub struct TargetEntry {
    pub path: String,
    pub settings: Result<TargetSettings, ExError>,
}

impl DatasetEntry {
    /// Whether this dataset or any of its targets failed to resolve
    pub fn has_errors(&self) -> bool {
        self.settings.is_err() || self.targets.iter().any(|t| t.settings.is_err())
    }
}

/// Resolve every dataset and target of a configuration, in file order
pub fn resolve_config(config: &ConfigFile) -> Vec<DatasetEntry> {
    config
        .datasets
        .iter()
        .map(|raw| DatasetEntry {
            path: raw.path.clone(),
            settings: resolve_dataset(config, raw),
            targets: raw
                .targets
                .iter()
                .map(|target| TargetEntry {
                    path: target.path.clone(),
                    settings: resolve_target(&config.defaults, target),
                })
                .collect(),
        })
        .collect()
}

fn resolve_policy(
    item_min: Option<&Value>,
    item_tier: Option<&Value>,
    defaults: &RawDefaults,
) -> Result<RetentionPolicy, ExError> {
    let min = normalize_min(resolve(item_min, defaults.preserve_min.as_ref(), &Value::Null))?;
    let tier = normalize_tier(resolve(item_tier, defaults.preserve.as_ref(), &Value::Null))?;
    Ok(RetentionPolicy::new(min, tier))
}

fn resolve_offsets(raw: &RawDataset, defaults: &RawDefaults) -> Result<PeriodOffsets, ExError> {
    let builtin = PeriodOffsets::default();
    let builtin_hour = Value::from(builtin.hour_start);
    let builtin_dow = Value::from(builtin.day_of_week_start);
    let builtin_wom = Value::from(builtin.week_of_month_start);
    let builtin_moy = Value::from(builtin.month_of_year_start);

    Ok(PeriodOffsets {
        hour_start: normalize_hour_start(resolve(
            raw.hour_start.as_ref(),
            defaults.hour_start.as_ref(),
            &builtin_hour,
        ))?,
        day_of_week_start: normalize_day_of_week(resolve(
            raw.day_of_week_start.as_ref(),
            defaults.day_of_week_start.as_ref(),
            &builtin_dow,
        ))?,
        week_of_month_start: normalize_week_of_month(resolve(
            raw.week_of_month_start.as_ref(),
            defaults.week_of_month_start.as_ref(),
            &builtin_wom,
        ))?,
        month_of_year_start: normalize_month_of_year(resolve(
            raw.month_of_year_start.as_ref(),
            defaults.month_of_year_start.as_ref(),
            &builtin_moy,
        ))?,
    })
}

/// Resolve one source dataset
///
/// # Errors
/// `InvalidPolicySpec` for a malformed policy, offset or timestamp format,
/// `InvalidInput` for an unusable dataset path.
pub fn resolve_dataset(config: &ConfigFile, raw: &RawDataset) -> Result<DatasetSettings, ExError> {
    let with_context = |e: ExError| e.with_dataset(raw.path.as_str());
    let defaults = &config.defaults;

    validate_dataset_path(&raw.path).map_err(|e| with_context(e.into()))?;

    let prefix = resolve(
        raw.prefix.as_deref(),
        defaults.prefix.as_deref(),
        DEFAULT_PREFIX,
    );
    let format = config
        .timestamp_format
        .as_deref()
        .unwrap_or(DEFAULT_TIMESTAMP_FORMAT);
    let naming = NamingScheme::new(prefix, format).map_err(|e| with_context(e.into()))?;

    Ok(DatasetSettings {
        path: raw.path.clone(),
        naming,
        recursive: resolve(raw.recursive, defaults.recursive, DEFAULT_RECURSIVE),
        offsets: resolve_offsets(raw, defaults).map_err(with_context)?,
        policy: resolve_policy(raw.preserve_min.as_ref(), raw.preserve.as_ref(), defaults)
            .map_err(with_context)?,
    })
}

/// Resolve one replication target
///
/// The policy falls back to the global defaults, not to the owning
/// dataset's policy.
///
/// # Errors
/// `InvalidPolicySpec` for a malformed policy, `InvalidInput` for an
/// unusable target path.
pub fn resolve_target(defaults: &RawDefaults, raw: &RawTarget) -> Result<TargetSettings, ExError> {
    let with_context = |e: ExError| e.with_target(raw.path.as_str());

    validate_dataset_path(&raw.path).map_err(|e| with_context(e.into()))?;

    Ok(TargetSettings {
        path: raw.path.clone(),
        policy: resolve_policy(raw.preserve_min.as_ref(), raw.preserve.as_ref(), defaults)
            .map_err(with_context)?,
    })
}
