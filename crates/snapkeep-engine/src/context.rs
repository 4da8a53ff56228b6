//! Immutable per-pass run context

use chrono::{Local, NaiveDateTime, Timelike};
use snapkeep_core_types::RunId;

/// Everything a pass needs to know about how it was invoked
///
/// Built once and read by every stage; nothing changes it mid-pass.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    /// The pass instant, minute precision
    pub now: NaiveDateTime,
    /// Skip every mutating store call
    pub dry_run: bool,
    /// Skip destroy calls only
    pub safe_mode: bool,
}

impl RunContext {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            run_id: RunId::new(),
            now: truncate_to_minute(now),
            dry_run: false,
            safe_mode: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    /// Whether create and transfer calls should reach the store
    pub fn allows_mutation(&self) -> bool {
        !self.dry_run
    }

    /// Whether destroy calls should reach the store
    pub fn allows_destroy(&self) -> bool {
        !self.dry_run && !self.safe_mode
    }
}

/// Drop seconds and below
pub fn truncate_to_minute(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Local wall-clock time, minute precision
pub fn current_minute() -> NaiveDateTime {
    truncate_to_minute(Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_now_is_truncated() {
        let instant = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_milli_opt(10, 30, 45, 500)
            .unwrap();
        let ctx = RunContext::new(instant);
        assert_eq!(ctx.now.second(), 0);
        assert_eq!(ctx.now.nanosecond(), 0);
        assert_eq!(ctx.now.minute(), 30);
    }

    #[test]
    fn test_mode_gates() {
        let now = current_minute();
        let normal = RunContext::new(now);
        assert!(normal.allows_mutation() && normal.allows_destroy());

        let safe = RunContext::new(now).with_safe_mode(true);
        assert!(safe.allows_mutation());
        assert!(!safe.allows_destroy());

        let dry = RunContext::new(now).with_dry_run(true);
        assert!(!dry.allows_mutation());
        assert!(!dry.allows_destroy());
    }
}
