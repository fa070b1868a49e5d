// src/core/timeout.rs

//! Converts caller-supplied waits into the store's whole-second timeouts.
//!
//! Blocking commands such as `BLPOP` take their timeout in seconds, and `0`
//! means "block forever" to the store. A positive wait shorter than a second
//! must therefore never be truncated to `0`; it is rounded up to one second.

use std::time::Duration;

/// A unit for a caller-supplied timeout amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Truncating conversion of `amount` in this unit to whole seconds.
    fn whole_seconds(self, amount: u64) -> u64 {
        match self {
            TimeUnit::Nanoseconds => amount / 1_000_000_000,
            TimeUnit::Microseconds => amount / 1_000_000,
            TimeUnit::Milliseconds => amount / 1_000,
            TimeUnit::Seconds => amount,
            TimeUnit::Minutes => amount.saturating_mul(60),
            TimeUnit::Hours => amount.saturating_mul(3_600),
            TimeUnit::Days => amount.saturating_mul(86_400),
        }
    }
}

/// Converts `amount` of `unit` to seconds. Zero stays zero; any other amount
/// is at least one second.
pub fn to_seconds(amount: u64, unit: TimeUnit) -> u64 {
    let seconds = unit.whole_seconds(amount);
    if amount != 0 && seconds == 0 {
        1
    } else {
        seconds
    }
}

/// Same as [`to_seconds`] for a `Duration`.
pub fn duration_to_seconds(timeout: Duration) -> u64 {
    let seconds = timeout.as_secs();
    if seconds == 0 && !timeout.is_zero() {
        1
    } else {
        seconds
    }
}
