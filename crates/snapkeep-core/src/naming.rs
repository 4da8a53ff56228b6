//! Snapshot naming codec
//!
//! Snapshot names follow `<dataset>@<prefix><timestamp>`. A name is
//! *managed* when its suffix starts with the configured prefix and the rest
//! parses under the configured timestamp format; every other name is
//! invisible to retention. Parsing never fails loudly: `None` is the signal.
//!
//! Timestamp formats use chrono `strftime` syntax. The default,
//! `%Y-%m-%d_%H-%M`, is fixed-width, so lexicographic order of names equals
//! chronological order.

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{Result, SnapkeepError};

/// Separator between the dataset path and the snapshot suffix
pub const SNAPSHOT_SEPARATOR: char = '@';

/// Default timestamp format (`yyyy-MM-dd_HH-mm`)
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Dataset part of a snapshot name (the whole name when there is no `@`)
pub fn dataset_of(name: &str) -> &str {
    match name.split_once(SNAPSHOT_SEPARATOR) {
        Some((dataset, _)) => dataset,
        None => name,
    }
}

/// Suffix part of a snapshot name (everything after the first `@`)
pub fn suffix_of(name: &str) -> Option<&str> {
    name.split_once(SNAPSHOT_SEPARATOR).map(|(_, suffix)| suffix)
}

/// Parse the timestamp of a managed snapshot name
///
/// Returns `None` when the name has no `@`, when the suffix does not start
/// with `prefix`, or when the remainder does not parse under `format`.
pub fn parse_managed_timestamp(name: &str, prefix: &str, format: &str) -> Option<NaiveDateTime> {
    let suffix = suffix_of(name)?;
    let stamp = suffix.strip_prefix(prefix)?;
    NaiveDateTime::parse_from_str(stamp, format).ok()
}

/// Format an instant under a timestamp format
///
/// # Errors
///
/// Returns `InvalidTimestampFormat` if `format` contains unknown specifiers.
pub fn format_timestamp(instant: &NaiveDateTime, format: &str) -> Result<String> {
    ensure_known_specifiers(format)?;
    Ok(instant.format(format).to_string())
}

/// Check that a dataset path can carry snapshots
///
/// # Errors
///
/// Returns `InvalidDatasetPath` for an empty path or one containing `@`.
pub fn validate_dataset_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(SnapkeepError::InvalidDatasetPath {
            path: path.to_string(),
            reason: "dataset path must not be empty".to_string(),
        });
    }
    if path.contains(SNAPSHOT_SEPARATOR) {
        return Err(SnapkeepError::InvalidDatasetPath {
            path: path.to_string(),
            reason: "dataset path must not contain '@'".to_string(),
        });
    }
    Ok(())
}

fn ensure_known_specifiers(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(SnapkeepError::InvalidTimestampFormat {
            format: format.to_string(),
            reason: "contains an unknown or incomplete specifier".to_string(),
        });
    }
    Ok(())
}

/// Prefix and timestamp format shared by every snapshot of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingScheme {
    prefix: String,
    timestamp_format: String,
}

impl NamingScheme {
    /// Build a validated naming scheme
    ///
    /// The format must carry date, hour and minute: an instant formatted with
    /// it has to parse back to the same minute.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimestampFormat` if the format is malformed or does not
    /// round-trip.
    pub fn new(prefix: impl Into<String>, timestamp_format: impl Into<String>) -> Result<Self> {
        let timestamp_format = timestamp_format.into();
        ensure_known_specifiers(&timestamp_format)?;

        let probe = NaiveDate::from_ymd_opt(2001, 11, 23)
            .and_then(|d| d.and_hms_opt(17, 41, 0))
            .ok_or_else(|| SnapkeepError::Internal {
                message: "probe instant out of range".to_string(),
            })?;
        let rendered = probe.format(&timestamp_format).to_string();
        match NaiveDateTime::parse_from_str(&rendered, &timestamp_format) {
            Ok(parsed) if parsed == probe => {}
            _ => {
                return Err(SnapkeepError::InvalidTimestampFormat {
                    format: timestamp_format,
                    reason: "must round-trip year, month, day, hour and minute".to_string(),
                })
            }
        }

        Ok(Self {
            prefix: prefix.into(),
            timestamp_format,
        })
    }

    /// Naming scheme with the default timestamp format
    ///
    /// # Errors
    ///
    /// Never fails in practice; kept fallible to share `new`'s validation.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self> {
        Self::new(prefix, DEFAULT_TIMESTAMP_FORMAT)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// Timestamp of a managed snapshot, `None` when unmanaged
    pub fn parse(&self, name: &str) -> Option<NaiveDateTime> {
        parse_managed_timestamp(name, &self.prefix, &self.timestamp_format)
    }

    /// `<prefix><timestamp>` for an instant
    pub fn suffix(&self, instant: &NaiveDateTime) -> String {
        format!(
            "{}{}",
            self.prefix,
            instant.format(&self.timestamp_format)
        )
    }

    /// Full snapshot name `<dataset>@<prefix><timestamp>`
    pub fn snapshot_name(&self, dataset: &str, instant: &NaiveDateTime) -> String {
        format!("{}{}{}", dataset, SNAPSHOT_SEPARATOR, self.suffix(instant))
    }
}
