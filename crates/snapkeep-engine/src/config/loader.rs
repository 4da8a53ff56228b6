//! Configuration file loader

#![allow(clippy::result_large_err)]

use std::fs;
use std::path::Path;

use snapkeep_core::errors::{ExError, ExErrorKind};

use crate::config::format::ConfigFile;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/snapkeep/snapkeep.yaml";

/// Read and parse a configuration file
///
/// # Errors
/// `ConfigUnreadable` if the file cannot be read, `ConfigParse` if it is not
/// a valid configuration document.
pub fn load_config(path: &Path) -> Result<ConfigFile, ExError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ExError::new(ExErrorKind::ConfigUnreadable)
            .with_op("load_config")
            .with_message(format!("cannot read {}: {}", path.display(), e))
    })?;

    parse_config_str(&content)
}

/// Parse a configuration document
///
/// An empty document is a configuration with no datasets.
///
/// # Errors
/// `ConfigParse` on malformed YAML or an unknown key.
pub fn parse_config_str(content: &str) -> Result<ConfigFile, ExError> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    serde_yaml::from_str(content).map_err(|e| {
        ExError::new(ExErrorKind::ConfigParse)
            .with_op("parse_config")
            .with_message(format!("YAML parse error: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config = parse_config_str("datasets:\n  - path: tank/data\n").unwrap();
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].path, "tank/data");
        assert!(config.datasets[0].targets.is_empty());
    }

    #[test]
    fn test_parse_empty_document() {
        let config = parse_config_str("\n").unwrap();
        assert!(config.datasets.is_empty());
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = parse_config_str("datasets:\n  - path: tank\n    perserve: all\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConfigParse);
    }

    #[test]
    fn test_policy_values_stay_raw() {
        let config = parse_config_str(
            "defaults:\n  preserve:\n    days: 7\n    months: unlimited\ndatasets: []\n",
        )
        .unwrap();
        let preserve = config.defaults.preserve.unwrap();
        assert_eq!(preserve["days"], serde_json::json!(7));
        assert_eq!(preserve["months"], serde_json::json!("unlimited"));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = load_config(Path::new("/nonexistent/snapkeep.yaml")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConfigUnreadable);
        assert!(err.kind().is_fatal());
    }
}
