//! Retention policy normalizer
//!
//! Turns raw configuration values into the canonical policy and offset
//! types. Raw values are `serde_json::Value`s so any serde-backed config
//! format (YAML, JSON, TOML) goes through the same validation.
//!
//! `Value::Null` stands for an absent setting. Callers decide defaults
//! through `settings::resolve` before calling in here, so `Null` only reaches
//! these functions when nothing was configured at any level.

use serde_json::Value;

use crate::errors::{Result, SnapkeepError};
use crate::policy::{PeriodUnit, RetentionMinSpec, RetentionTierSpec, TierAmount};

pub const FIELD_PRESERVE_MIN: &str = "preserve_min";
pub const FIELD_PRESERVE: &str = "preserve";
pub const FIELD_HOUR_START: &str = "hour_start";
pub const FIELD_DAY_OF_WEEK_START: &str = "day_of_week_start";
pub const FIELD_WEEK_OF_MONTH_START: &str = "week_of_month_start";
pub const FIELD_MONTH_OF_YEAR_START: &str = "month_of_year_start";

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn describe(raw: &Value) -> String {
    match raw {
        Value::Null => "nothing".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("'{}'", s),
        Value::Array(_) => "a list".to_string(),
        Value::Object(_) => "a map".to_string(),
    }
}

fn keyword(raw: &Value) -> Option<String> {
    raw.as_str().map(|s| s.trim().to_ascii_lowercase())
}

/// Non-negative integer, or a reason it is not one
fn whole_number(raw: &Value) -> std::result::Result<u64, String> {
    match raw {
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(v), _) => Ok(v),
            (None, Some(v)) => Err(format!("{} is negative", v)),
            _ => Err(format!("{} is not a whole number", n)),
        },
        other => Err(format!("expected a whole number, got {}", describe(other))),
    }
}

fn amount_u32(field: &str, raw: &Value) -> Result<u32> {
    let value = whole_number(raw).map_err(|reason| SnapkeepError::policy(field, reason))?;
    u32::try_from(value).map_err(|_| SnapkeepError::policy(field, format!("{} is too large", value)))
}

/// Normalize a minimum-retention spec
///
/// `all`, `latest` and `none` map to their variants; a single-key map such
/// as `{days: 3}` maps to a duration. `Null` is the global default, `All`.
///
/// # Errors
///
/// Returns `InvalidPolicySpec` for unknown keywords, multi-key maps, unknown
/// units, and non-positive amounts.
pub fn normalize_min(raw: &Value) -> Result<RetentionMinSpec> {
    match raw {
        Value::Null => Ok(RetentionMinSpec::All),
        Value::String(_) => match keyword(raw).as_deref() {
            Some("all") => Ok(RetentionMinSpec::All),
            Some("latest") => Ok(RetentionMinSpec::Latest),
            Some("none") => Ok(RetentionMinSpec::None),
            _ => Err(SnapkeepError::policy(
                FIELD_PRESERVE_MIN,
                format!("unknown keyword {}", describe(raw)),
            )),
        },
        Value::Object(map) => {
            let mut entries = map.iter();
            let (Some((unit_name, amount)), None) = (entries.next(), entries.next()) else {
                return Err(SnapkeepError::policy(
                    FIELD_PRESERVE_MIN,
                    format!("duration map needs exactly one unit, got {}", map.len()),
                ));
            };
            let unit = PeriodUnit::parse(unit_name).ok_or_else(|| {
                SnapkeepError::policy(FIELD_PRESERVE_MIN, format!("unknown unit '{}'", unit_name))
            })?;
            let amount = amount_u32(FIELD_PRESERVE_MIN, amount)?;
            if amount == 0 {
                return Err(SnapkeepError::policy(
                    FIELD_PRESERVE_MIN,
                    "duration amount must be positive",
                ));
            }
            Ok(RetentionMinSpec::Duration { unit, amount })
        }
        other => Err(SnapkeepError::policy(
            FIELD_PRESERVE_MIN,
            format!("expected a keyword or a duration map, got {}", describe(other)),
        )),
    }
}

/// Normalize a tiered-preserve spec
///
/// `none` or `Null` yield an empty spec. A map takes each unit to a whole
/// number or `unlimited`; an amount of 0 is accepted and keeps nothing.
///
/// # Errors
///
/// Returns `InvalidPolicySpec` for any other shape, unknown units, units
/// given twice under different spellings, and malformed amounts.
pub fn normalize_tier(raw: &Value) -> Result<RetentionTierSpec> {
    match raw {
        Value::Null => Ok(RetentionTierSpec::none()),
        Value::String(_) if keyword(raw).as_deref() == Some("none") => {
            Ok(RetentionTierSpec::none())
        }
        Value::Object(map) => {
            let mut tier = RetentionTierSpec::none();
            for (unit_name, amount) in map {
                let unit = PeriodUnit::parse(unit_name).ok_or_else(|| {
                    SnapkeepError::policy(FIELD_PRESERVE, format!("unknown unit '{}'", unit_name))
                })?;
                if tier.get(unit).is_some() {
                    return Err(SnapkeepError::policy(
                        FIELD_PRESERVE,
                        format!("unit '{}' given more than once", unit),
                    ));
                }
                let amount = if keyword(amount).as_deref() == Some("unlimited") {
                    TierAmount::Unlimited
                } else {
                    TierAmount::Count(amount_u32(FIELD_PRESERVE, amount)?)
                };
                tier = tier.with(unit, amount);
            }
            Ok(tier)
        }
        other => Err(SnapkeepError::policy(
            FIELD_PRESERVE,
            format!("expected 'none' or a unit map, got {}", describe(other)),
        )),
    }
}

fn in_range(field: &str, raw: &Value, min: u64, max: u64) -> Result<u32> {
    let value = whole_number(raw).map_err(|reason| SnapkeepError::policy(field, reason))?;
    if value < min || value > max {
        return Err(SnapkeepError::policy(
            field,
            format!("{} is outside {}..={}", value, min, max),
        ));
    }
    // bounded by max above
    u32::try_from(value).map_err(|_| SnapkeepError::policy(field, "out of range"))
}

fn symbol_index(names: &[&str], symbol: &str) -> Option<u32> {
    names
        .iter()
        .position(|name| *name == symbol || (symbol.len() == 3 && name.starts_with(symbol)))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// Normalize the hour a day starts at (0-23)
///
/// # Errors
///
/// Returns `InvalidPolicySpec` for non-integers and values outside 0..=23.
pub fn normalize_hour_start(raw: &Value) -> Result<u32> {
    in_range(FIELD_HOUR_START, raw, 0, 23)
}

/// Normalize the weekday a week starts on to 1 (Monday) ..= 7 (Sunday)
///
/// Accepts full or three-letter names in any case, or an integer 0..=7;
/// 0 and 7 both mean Sunday.
///
/// # Errors
///
/// Returns `InvalidPolicySpec` for unknown names and out-of-range integers.
pub fn normalize_day_of_week(raw: &Value) -> Result<u32> {
    if let Some(symbol) = keyword(raw) {
        return symbol_index(&WEEKDAYS, &symbol).ok_or_else(|| {
            SnapkeepError::policy(
                FIELD_DAY_OF_WEEK_START,
                format!("unknown weekday {}", describe(raw)),
            )
        });
    }
    match in_range(FIELD_DAY_OF_WEEK_START, raw, 0, 7)? {
        0 => Ok(7),
        day => Ok(day),
    }
}

/// Normalize the week of month a month starts at (1-4)
///
/// # Errors
///
/// Returns `InvalidPolicySpec` for non-integers and values outside 1..=4.
pub fn normalize_week_of_month(raw: &Value) -> Result<u32> {
    in_range(FIELD_WEEK_OF_MONTH_START, raw, 1, 4)
}

/// Normalize the month a year starts at to 1 (January) ..= 12 (December)
///
/// Accepts full or three-letter names in any case, or an integer 1..=12.
///
/// # Errors
///
/// Returns `InvalidPolicySpec` for unknown names and out-of-range integers.
pub fn normalize_month_of_year(raw: &Value) -> Result<u32> {
    if let Some(symbol) = keyword(raw) {
        return symbol_index(&MONTHS, &symbol).ok_or_else(|| {
            SnapkeepError::policy(
                FIELD_MONTH_OF_YEAR_START,
                format!("unknown month {}", describe(raw)),
            )
        });
    }
    in_range(FIELD_MONTH_OF_YEAR_START, raw, 1, 12)
}
