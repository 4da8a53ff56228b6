//! Run report
//!
//! What one pass did to each dataset and target, and where each item
//! stopped if it failed.

use chrono::NaiveDateTime;
use snapkeep_core::errors::ExError;
use snapkeep_core_types::RunId;

/// Last stage a dataset reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatasetStage {
    Setup,
    Created,
    Enumerated,
    RetentionApplied,
    Destroyed,
    Done,
}

/// Last stage a target reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetStage {
    Setup,
    Enumerated,
    BaseChosen,
    TransferDecided,
    Transferred,
    RetentionApplied,
    Destroyed,
    Done,
}

/// Why a snapshot was or was not sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The planner was not reached
    NotAttempted,
    /// The snapshot created this pass was not kept on the source
    NoCandidate,
    /// The target already holds the snapshot
    AlreadyPresent,
    /// The target's own policy would discard the snapshot
    NotRetained,
    Sent {
        target_name: String,
        incremental_base: Option<String>,
    },
}

/// Destroys of one dataset or target
#[derive(Debug, Clone, Default)]
pub struct DestroyOutcome {
    /// Destroyed, or in a dry run would have been
    pub destroyed: Vec<String>,
    /// Held back by safe mode
    pub suppressed: Vec<String>,
    pub failed: Vec<ExError>,
}

#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: String,
    pub stage: TargetStage,
    pub transfer: TransferOutcome,
    pub keep: Vec<String>,
    pub destroy: DestroyOutcome,
    /// Failure that stopped this target
    pub error: Option<ExError>,
}

impl TargetReport {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            stage: TargetStage::Setup,
            transfer: TransferOutcome::NotAttempted,
            keep: Vec::new(),
            destroy: DestroyOutcome::default(),
            error: None,
        }
    }

    pub fn failure_count(&self) -> usize {
        usize::from(self.error.is_some()) + self.destroy.failed.len()
    }
}

#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub dataset: String,
    pub stage: DatasetStage,
    /// Snapshot this pass created or found already present
    pub created: Option<String>,
    pub keep: Vec<String>,
    pub destroy: DestroyOutcome,
    /// Failure that stopped this dataset and its targets
    pub error: Option<ExError>,
    pub targets: Vec<TargetReport>,
}

impl DatasetReport {
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            stage: DatasetStage::Setup,
            created: None,
            keep: Vec::new(),
            destroy: DestroyOutcome::default(),
            error: None,
            targets: Vec::new(),
        }
    }

    /// Failures of this dataset and all of its targets
    pub fn failure_count(&self) -> usize {
        usize::from(self.error.is_some())
            + self.destroy.failed.len()
            + self
                .targets
                .iter()
                .map(TargetReport::failure_count)
                .sum::<usize>()
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub now: NaiveDateTime,
    pub dry_run: bool,
    pub safe_mode: bool,
    pub datasets: Vec<DatasetReport>,
}

impl RunReport {
    pub fn failure_count(&self) -> usize {
        self.datasets.iter().map(DatasetReport::failure_count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn dataset(&self, path: &str) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.dataset == path)
    }
}
