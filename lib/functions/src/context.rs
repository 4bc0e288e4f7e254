use chrono::{Local, NaiveDate, NaiveDateTime};

/// The clock the volatile date builtins read.
///
/// Captured once per evaluation so `TODAY()` and `NOW()` are stable within a
/// single formula, and injectable so tests are deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionContext {
    pub today: NaiveDate,
    pub now: NaiveDateTime,
}

impl FunctionContext {
    /// Captures the current local clock.
    pub fn capture() -> Self {
        let now = Local::now().naive_local();
        Self {
            today: now.date(),
            now,
        }
    }

    /// A fixed clock for deterministic evaluation.
    pub fn fixed(now: NaiveDateTime) -> Self {
        Self {
            today: now.date(),
            now,
        }
    }
}

impl Default for FunctionContext {
    fn default() -> Self {
        Self::capture()
    }
}
