//! snapkeep Core - Pure snapshot retention and replication decisions
//!
//! This crate holds everything that decides what happens to snapshots,
//! without ever touching a storage tool:
//! - Snapshot naming codec (`dataset@prefix<timestamp>`)
//! - Retention policy normalization from raw configuration values
//! - Calendar period bucketing with configurable period starts
//! - The retention engine computing keep/destroy partitions
//! - The replication planner choosing incremental bases and transfers
//! - Resolved per-dataset and per-target settings
//!
//! Error and logging facilities shared by the other crates also live here.

pub mod errors;
pub mod logging_facility;
pub mod naming;
pub mod normalize;
pub mod period;
pub mod policy;
pub mod replication;
pub mod retention;
pub mod settings;

/// Re-exported so the logging macros can name schema constants through `$crate`.
pub use snapkeep_core_types as core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, SnapkeepError};
pub use naming::NamingScheme;
pub use period::{bucket_key, BucketKey, PeriodOffsets};
pub use policy::{PeriodUnit, RetentionMinSpec, RetentionPolicy, RetentionTierSpec, TierAmount};
pub use replication::{ReplicationPlan, TargetState};
pub use retention::{apply_retention, RetentionResult};
pub use settings::{DatasetSettings, TargetSettings};
