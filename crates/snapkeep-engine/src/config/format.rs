//! Configuration file schema
//!
//! Policy and offset fields stay raw [`Value`]s here. They are normalized per
//! dataset or target during resolution, so a bad value fails that item only
//! instead of the whole file.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// strftime format of the snapshot timestamp, shared by every dataset
    #[serde(default)]
    pub timestamp_format: Option<String>,

    /// Global defaults
    #[serde(default)]
    pub defaults: RawDefaults,

    /// Source datasets, processed in this order
    #[serde(default)]
    pub datasets: Vec<RawDataset>,
}

/// Settings every dataset inherits unless it overrides them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDefaults {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub recursive: Option<bool>,
    #[serde(default)]
    pub hour_start: Option<Value>,
    #[serde(default)]
    pub day_of_week_start: Option<Value>,
    #[serde(default)]
    pub week_of_month_start: Option<Value>,
    #[serde(default)]
    pub month_of_year_start: Option<Value>,
    #[serde(default)]
    pub preserve_min: Option<Value>,
    #[serde(default)]
    pub preserve: Option<Value>,
}

/// One source dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDataset {
    /// Dataset path, e.g. `tank/home`
    pub path: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub recursive: Option<bool>,
    #[serde(default)]
    pub hour_start: Option<Value>,
    #[serde(default)]
    pub day_of_week_start: Option<Value>,
    #[serde(default)]
    pub week_of_month_start: Option<Value>,
    #[serde(default)]
    pub month_of_year_start: Option<Value>,
    #[serde(default)]
    pub preserve_min: Option<Value>,
    #[serde(default)]
    pub preserve: Option<Value>,

    /// Replication targets of this dataset
    #[serde(default)]
    pub targets: Vec<RawTarget>,
}

/// One replication target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTarget {
    /// Target dataset path, e.g. `backup/home`
    pub path: String,
    #[serde(default)]
    pub preserve_min: Option<Value>,
    #[serde(default)]
    pub preserve: Option<Value>,
}
