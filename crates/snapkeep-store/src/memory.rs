//! In-memory snapshot store
//!
//! Holds datasets and their snapshots in a map and records every mutating
//! call. Failures can be injected per operation and subject to exercise the
//! orchestrator's error isolation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use snapkeep_core::naming::{dataset_of, suffix_of, SNAPSHOT_SEPARATOR};

use crate::collaborator::SnapshotStore;
use crate::errors::{base_missing, dataset_missing, injected_failure, state_poisoned, Result};

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreOp {
    Enumerate,
    Create,
    Destroy,
    Transfer,
}

impl StoreOp {
    fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Enumerate => "enumerate",
            StoreOp::Create => "create",
            StoreOp::Destroy => "destroy",
            StoreOp::Transfer => "transfer",
        }
    }
}

/// A mutating call that reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create {
        full_name: String,
        recursive: bool,
    },
    Destroy {
        full_name: String,
    },
    Transfer {
        source_name: String,
        target_dataset: String,
        incremental_base: Option<String>,
    },
}

#[derive(Debug, Default)]
struct State {
    datasets: BTreeMap<String, BTreeSet<String>>,
    failures: BTreeSet<(StoreOp, String)>,
    calls: Vec<StoreCall>,
}

impl State {
    fn check_failure(&self, op: StoreOp, subject: &str) -> Result<()> {
        if self.failures.contains(&(op, subject.to_string())) {
            return Err(injected_failure(op.as_str(), subject));
        }
        Ok(())
    }
}

/// Snapshot store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, op: &str) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| state_poisoned(op))
    }

    /// Add an empty dataset; existing datasets are left alone
    pub fn add_dataset(&self, dataset: &str) -> Result<()> {
        self.lock("add_dataset")?
            .datasets
            .entry(dataset.to_string())
            .or_default();
        Ok(())
    }

    /// Place a snapshot directly, creating its dataset if needed
    ///
    /// Not recorded as a call.
    pub fn insert_snapshot(&self, full_name: &str) -> Result<()> {
        self.lock("insert_snapshot")?
            .datasets
            .entry(dataset_of(full_name).to_string())
            .or_default()
            .insert(full_name.to_string());
        Ok(())
    }

    /// Make every `op` on `subject` fail
    ///
    /// The subject is the dataset for enumerate and create, the full snapshot
    /// name for destroy, and the target dataset for transfer.
    pub fn fail_on(&self, op: StoreOp, subject: &str) -> Result<()> {
        self.lock("fail_on")?
            .failures
            .insert((op, subject.to_string()));
        Ok(())
    }

    /// Snapshots currently on `dataset`, empty if unknown
    pub fn snapshots(&self, dataset: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .lock("snapshots")?
            .datasets
            .get(dataset)
            .cloned()
            .unwrap_or_default())
    }

    /// Mutating calls received so far, in order
    pub fn calls(&self) -> Result<Vec<StoreCall>> {
        Ok(self.lock("calls")?.calls.clone())
    }
}

impl SnapshotStore for MemoryStore {
    fn enumerate(&self, dataset: &str) -> Result<BTreeSet<String>> {
        let state = self.lock("enumerate")?;
        state.check_failure(StoreOp::Enumerate, dataset)?;
        state
            .datasets
            .get(dataset)
            .cloned()
            .ok_or_else(|| dataset_missing("enumerate", dataset))
    }

    fn create(&self, dataset: &str, full_name: &str, recursive: bool) -> Result<()> {
        let mut state = self.lock("create")?;
        state.check_failure(StoreOp::Create, dataset)?;
        if !state.datasets.contains_key(dataset) {
            return Err(dataset_missing("create", dataset));
        }
        if state.datasets.get(dataset).is_some_and(|s| s.contains(full_name)) {
            return Ok(());
        }
        state.calls.push(StoreCall::Create {
            full_name: full_name.to_string(),
            recursive,
        });

        let suffix = suffix_of(full_name).unwrap_or(full_name).to_string();
        let child_prefix = format!("{}/", dataset);
        for (path, snapshots) in state.datasets.iter_mut() {
            let is_child = recursive && path.starts_with(&child_prefix);
            if path == dataset || is_child {
                snapshots.insert(format!("{}{}{}", path, SNAPSHOT_SEPARATOR, suffix));
            }
        }
        Ok(())
    }

    fn destroy(&self, full_name: &str) -> Result<()> {
        let mut state = self.lock("destroy")?;
        state.check_failure(StoreOp::Destroy, full_name)?;
        let present = state
            .datasets
            .get(dataset_of(full_name))
            .is_some_and(|s| s.contains(full_name));
        if !present {
            return Ok(());
        }
        state.calls.push(StoreCall::Destroy {
            full_name: full_name.to_string(),
        });
        if let Some(snapshots) = state.datasets.get_mut(dataset_of(full_name)) {
            snapshots.remove(full_name);
        }
        Ok(())
    }

    fn transfer(
        &self,
        source_name: &str,
        target_dataset: &str,
        incremental_base: Option<&str>,
    ) -> Result<()> {
        let mut state = self.lock("transfer")?;
        state.check_failure(StoreOp::Transfer, target_dataset)?;

        let source_dataset = dataset_of(source_name);
        let on_source = |name: &str| {
            state
                .datasets
                .get(source_dataset)
                .is_some_and(|s| s.contains(name))
        };
        if !on_source(source_name) {
            return Err(dataset_missing("transfer", source_dataset).with_snapshot(source_name));
        }
        if let Some(base) = incremental_base {
            let base_suffix = suffix_of(base).unwrap_or(base);
            let base_on_target = state.datasets.get(target_dataset).is_some_and(|s| {
                s.contains(&format!("{}{}{}", target_dataset, SNAPSHOT_SEPARATOR, base_suffix))
            });
            if !on_source(base) || !base_on_target {
                return Err(base_missing(base, target_dataset));
            }
        }

        let suffix = suffix_of(source_name).unwrap_or(source_name);
        let target_name = format!("{}{}{}", target_dataset, SNAPSHOT_SEPARATOR, suffix);
        let target = state.datasets.entry(target_dataset.to_string()).or_default();
        if target.contains(&target_name) {
            return Ok(());
        }
        target.insert(target_name);
        state.calls.push(StoreCall::Transfer {
            source_name: source_name.to_string(),
            target_dataset: target_dataset.to_string(),
            incremental_base: incremental_base.map(str::to_string),
        });
        Ok(())
    }
}
