use chrono::{NaiveDate, NaiveDateTime};
use snapkeep_core::NamingScheme;

/// Naming scheme with the `test_` prefix and the default timestamp format
#[allow(dead_code)]
pub fn test_scheme() -> NamingScheme {
    NamingScheme::with_prefix("test_").unwrap()
}

/// Minute-precision instant
#[allow(dead_code)]
pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// Full snapshot names on `dataset` for the given default-format stamps
#[allow(dead_code)]
pub fn snapshots(dataset: &str, stamps: &[&str]) -> Vec<String> {
    stamps
        .iter()
        .map(|stamp| format!("{}@test_{}", dataset, stamp))
        .collect()
}
