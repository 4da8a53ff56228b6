//! Command orchestration layer.
//!
//! Provides the high-level commands that coordinate core decision logic
//! with a snapshot store.

pub mod run;
