//! snapkeep Store - snapshot storage collaborators
//!
//! Provides:
//! - The [`SnapshotStore`] trait the run orchestrator drives
//! - [`ZfsCli`], which runs the `zfs` command line tool
//! - [`MemoryStore`], an in-memory store with failure injection for tests

pub mod collaborator;
pub mod errors;
pub mod memory;
pub mod zfs;

// Re-export key types
pub use collaborator::SnapshotStore;
pub use errors::Result;
pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use zfs::ZfsCli;
