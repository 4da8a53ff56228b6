//! Resolved per-dataset and per-target settings
//!
//! Every setting resolves once, at setup time, through [`resolve`]: the
//! dataset or target value wins over the global default, which wins over the
//! built-in default. The structs here are what the retention engine and
//! planner consume; nothing downstream looks at raw configuration again.

use crate::naming::NamingScheme;
use crate::period::PeriodOffsets;
use crate::policy::RetentionPolicy;

/// Built-in snapshot prefix
pub const DEFAULT_PREFIX: &str = "snapkeep_";

/// Built-in recursive flag for snapshot creation
pub const DEFAULT_RECURSIVE: bool = true;

/// Pick the most specific configured value
///
/// # Example
/// ```
/// use snapkeep_core::settings::resolve;
///
/// assert_eq!(resolve(Some(6), Some(3), 0), 6);
/// assert_eq!(resolve(None, Some(3), 0), 3);
/// assert_eq!(resolve(None, None, 0), 0);
/// ```
pub fn resolve<T>(item: Option<T>, global: Option<T>, builtin: T) -> T {
    item.or(global).unwrap_or(builtin)
}

/// Fully resolved settings of one source dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSettings {
    pub path: String,
    pub naming: NamingScheme,
    pub recursive: bool,
    pub offsets: PeriodOffsets,
    pub policy: RetentionPolicy,
}

/// Fully resolved settings of one replication target
///
/// Naming and offsets come from the owning dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSettings {
    pub path: String,
    pub policy: RetentionPolicy,
}
