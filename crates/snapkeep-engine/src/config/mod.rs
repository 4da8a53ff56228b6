//! Configuration file handling
//!
//! - [`format`]: the raw YAML schema
//! - [`loader`]: reading and parsing a file
//! - [`resolve`]: turning raw entries into resolved settings

pub mod format;
pub mod loader;
pub mod resolve;

pub use format::{ConfigFile, RawDataset, RawDefaults, RawTarget};
pub use loader::{load_config, parse_config_str};
pub use resolve::{resolve_config, DatasetEntry, TargetEntry};
