//! Manually driven clock for deterministic lease-timing tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tenure_core::Clock;

/// A clock that only moves when the test advances it.
///
/// Pairs with `tokio::test(start_paused = true)`: the tokio clock drives
/// intervals and sleeps, this one drives lease-record validity.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ms: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(now_ms: u64) -> Self {
        let clock = Self::new();
        clock.set(now_ms);
        clock
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_unix_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
