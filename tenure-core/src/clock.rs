//! Time source abstraction for lease validity checks.
//!
//! Lease validity is decided by comparing record timestamps against "now".
//! The elector takes its notion of now from this trait so tests can drive
//! time deterministically instead of racing the wall clock.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time as unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_unix_millis(&self) -> u64;
}

/// Wall-clock time via `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_unix_millis(&self) -> u64 {
        (**self).now_unix_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_unix_millis();
        let b = clock.now_unix_millis();
        assert!(b >= a);
        // Sanity: we are well past 2020.
        assert!(a > 1_577_836_800_000);
    }
}
