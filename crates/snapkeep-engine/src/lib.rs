//! snapkeep Engine - Orchestration layer
//!
//! Provides the run orchestrator that coordinates the pure retention and
//! replication logic in snapkeep-core with a snapshot store, plus the
//! configuration file loader and the run report.

pub mod cache;
pub mod commands;
pub mod config;
pub mod context;
pub mod report;

pub use cache::SnapshotCache;
pub use context::RunContext;
pub use report::RunReport;
