//! Snapshot cache
//!
//! Remembers what each dataset holds after its first enumeration and is
//! updated for every create, destroy and transfer the pass performs or, in
//! dry-run mode, would perform. Owned by a single pass.

#![allow(clippy::result_large_err)]

use std::collections::{BTreeMap, BTreeSet};

use snapkeep_core::naming::{dataset_of, SNAPSHOT_SEPARATOR};
use snapkeep_core::ExErrorKind;
use snapkeep_store::{Result, SnapshotStore};

#[derive(Debug, Clone)]
struct Creation {
    dataset: String,
    suffix: String,
    recursive: bool,
}

impl Creation {
    fn reaches(&self, path: &str) -> bool {
        path == self.dataset
            || (self.recursive
                && path
                    .strip_prefix(self.dataset.as_str())
                    .is_some_and(|rest| rest.starts_with('/')))
    }
}

/// Per-pass view of what every touched dataset holds
///
/// Creations and transfers recorded before a dataset is first enumerated
/// are applied to it when it is, so dry-run passes see the same state a
/// real pass would.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    datasets: BTreeMap<String, BTreeSet<String>>,
    creations: Vec<Creation>,
    transfers: BTreeSet<String>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots on `dataset`, enumerating through `store` on first use
    ///
    /// # Errors
    /// Propagates the store's enumerate failure; nothing is cached then.
    pub fn snapshots(
        &mut self,
        store: &dyn SnapshotStore,
        dataset: &str,
    ) -> Result<&BTreeSet<String>> {
        self.hydrate(store, dataset, false)?;
        Ok(&*self.datasets.entry(dataset.to_string()).or_default())
    }

    /// Snapshots on a replication target
    ///
    /// A target the store reports missing is cached as empty; the first full
    /// send creates it.
    ///
    /// # Errors
    /// Propagates every other enumerate failure.
    pub fn target_snapshots(
        &mut self,
        store: &dyn SnapshotStore,
        dataset: &str,
    ) -> Result<&BTreeSet<String>> {
        self.hydrate(store, dataset, true)?;
        Ok(&*self.datasets.entry(dataset.to_string()).or_default())
    }

    fn hydrate(
        &mut self,
        store: &dyn SnapshotStore,
        dataset: &str,
        missing_is_empty: bool,
    ) -> Result<()> {
        if self.datasets.contains_key(dataset) {
            return Ok(());
        }
        let mut listed = match store.enumerate(dataset) {
            Ok(listed) => listed,
            Err(e) if missing_is_empty && e.kind() == ExErrorKind::DatasetMissing => {
                BTreeSet::new()
            }
            Err(e) => return Err(e),
        };
        for creation in self.creations.iter().filter(|c| c.reaches(dataset)) {
            listed.insert(format!("{}{}{}", dataset, SNAPSHOT_SEPARATOR, creation.suffix));
        }
        listed.extend(
            self.transfers
                .iter()
                .filter(|name| dataset_of(name) == dataset)
                .cloned(),
        );
        self.datasets.insert(dataset.to_string(), listed);
        Ok(())
    }

    /// Record a new snapshot on `dataset`, and on cached descendants if recursive
    pub fn record_created(&mut self, dataset: &str, suffix: &str, recursive: bool) {
        let creation = Creation {
            dataset: dataset.to_string(),
            suffix: suffix.to_string(),
            recursive,
        };
        for (path, snapshots) in self.datasets.iter_mut() {
            if creation.reaches(path) {
                snapshots.insert(format!("{}{}{}", path, SNAPSHOT_SEPARATOR, suffix));
            }
        }
        self.creations.push(creation);
    }

    pub fn record_destroyed(&mut self, full_name: &str) {
        if let Some(snapshots) = self.datasets.get_mut(dataset_of(full_name)) {
            snapshots.remove(full_name);
        }
    }

    pub fn record_transferred(&mut self, target_name: &str) {
        if let Some(snapshots) = self.datasets.get_mut(dataset_of(target_name)) {
            snapshots.insert(target_name.to_string());
        }
        self.transfers.insert(target_name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapkeep_store::{MemoryStore, StoreOp};

    #[test]
    fn test_enumerates_once() {
        let store = MemoryStore::new();
        store.insert_snapshot("tank@a").unwrap();
        let mut cache = SnapshotCache::new();

        assert_eq!(cache.snapshots(&store, "tank").unwrap().len(), 1);
        store.insert_snapshot("tank@b").unwrap();
        assert_eq!(cache.snapshots(&store, "tank").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_enumeration_is_not_cached() {
        let store = MemoryStore::new();
        let mut cache = SnapshotCache::new();

        assert!(cache.snapshots(&store, "tank").is_err());
        store.insert_snapshot("tank@a").unwrap();
        assert!(cache.snapshots(&store, "tank").unwrap().contains("tank@a"));
    }

    #[test]
    fn test_missing_target_is_empty_until_transfer() {
        let store = MemoryStore::new();
        let mut cache = SnapshotCache::new();

        assert!(cache.target_snapshots(&store, "backup").unwrap().is_empty());
        cache.record_transferred("backup@a");
        assert!(cache.target_snapshots(&store, "backup").unwrap().contains("backup@a"));
    }

    #[test]
    fn test_target_lookup_still_propagates_other_failures() {
        let store = MemoryStore::new();
        store.add_dataset("backup").unwrap();
        store.fail_on(StoreOp::Enumerate, "backup").unwrap();
        let mut cache = SnapshotCache::new();

        let err = cache.target_snapshots(&store, "backup").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Collaborator);
    }

    #[test]
    fn test_recursive_create_updates_cached_children() {
        let store = MemoryStore::new();
        store.add_dataset("tank").unwrap();
        store.add_dataset("tank/child").unwrap();
        let mut cache = SnapshotCache::new();
        cache.snapshots(&store, "tank").unwrap();
        cache.snapshots(&store, "tank/child").unwrap();

        cache.record_created("tank", "p_1", true);

        assert!(cache.snapshots(&store, "tank/child").unwrap().contains("tank/child@p_1"));
    }

    #[test]
    fn test_creation_applies_to_later_enumeration() {
        // Nothing reaches the store, as in a dry run
        let store = MemoryStore::new();
        store.add_dataset("tank").unwrap();
        store.add_dataset("tank/child").unwrap();
        store.add_dataset("tankother").unwrap();
        let mut cache = SnapshotCache::new();

        cache.record_created("tank", "p_1", true);

        assert!(cache.snapshots(&store, "tank").unwrap().contains("tank@p_1"));
        assert!(cache.snapshots(&store, "tank/child").unwrap().contains("tank/child@p_1"));
        assert!(cache.snapshots(&store, "tankother").unwrap().is_empty());
    }

    #[test]
    fn test_destroy_and_transfer_bookkeeping() {
        let store = MemoryStore::new();
        store.insert_snapshot("tank@a").unwrap();
        store.add_dataset("backup").unwrap();
        let mut cache = SnapshotCache::new();
        cache.snapshots(&store, "tank").unwrap();

        cache.record_destroyed("tank@a");
        cache.record_transferred("backup@a");

        assert!(cache.snapshots(&store, "tank").unwrap().is_empty());
        assert!(cache.snapshots(&store, "backup").unwrap().contains("backup@a"));
    }
}
