//! The storage collaborator seam
//!
//! Everything the run orchestrator needs from the storage layer. Each call
//! is idempotent, so a pass can be retried after a partial failure.

use std::collections::BTreeSet;

use crate::errors::Result;

/// Snapshot storage backend
pub trait SnapshotStore: Send + Sync {
    /// Full names (`<dataset>@<suffix>`) of every snapshot directly on `dataset`
    ///
    /// # Errors
    /// Fails if the dataset does not exist or the backend cannot be queried.
    fn enumerate(&self, dataset: &str) -> Result<BTreeSet<String>>;

    /// Create `full_name` on `dataset`, and on its descendants if `recursive`
    ///
    /// No-op if the snapshot already exists.
    ///
    /// # Errors
    /// Fails if the backend rejects the snapshot.
    fn create(&self, dataset: &str, full_name: &str, recursive: bool) -> Result<()>;

    /// Destroy one snapshot; no-op if it is absent
    ///
    /// # Errors
    /// Fails if the backend refuses, for instance because the snapshot is held.
    fn destroy(&self, full_name: &str) -> Result<()>;

    /// Send `source_name` into `target_dataset`
    ///
    /// With an `incremental_base` only the delta from that source snapshot is
    /// sent. No-op if the target already holds a snapshot with the same suffix.
    ///
    /// # Errors
    /// Fails if either side of the transfer fails.
    fn transfer(
        &self,
        source_name: &str,
        target_dataset: &str,
        incremental_base: Option<&str>,
    ) -> Result<()>;
}
