//! Retry policies with jittered backoff.
//!
//! One [`RetryState`] is created per logical operation and never shared
//! across calls. The delay schedule is pluggable; the default policy uses a
//! fixed schedule perturbed by Gaussian jitter (standard deviation of a
//! quarter of the scheduled delay, clamped to zero) so synchronized callers
//! do not retry in lockstep.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

/// Maps an attempt number (1-based, counting failed attempts so far) to the
/// unjittered delay before the next attempt.
pub trait BackoffSchedule: Send + Sync {
    fn delay_for(&self, attempt: u32) -> Duration;
}

/// Same delay for every attempt. The default schedule.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    pub delay: Duration,
}

impl BackoffSchedule for FixedBackoff {
    fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Delay grows by `base` per attempt, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffSchedule for LinearBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        (self.base * attempt).min(self.max)
    }
}

/// Delay multiplies by `multiplier` per attempt, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl BackoffSchedule for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = self.base.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max.as_secs_f64()))
    }
}

/// Source of standard-normal samples for jitter.
///
/// Injectable so tests can pin the noise; see [`GaussianJitter`] for the
/// production source.
pub trait JitterSource: Send {
    fn sample_standard_normal(&mut self) -> f64;
}

/// Standard-normal sampling over an owned RNG via the Box–Muller transform.
pub struct GaussianJitter<R: Rng + Send = StdRng> {
    rng: R,
}

impl GaussianJitter<StdRng> {
    /// Creates a jitter source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic jitter source for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send> GaussianJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> JitterSource for GaussianJitter<R> {
    fn sample_standard_normal(&mut self) -> f64 {
        let u1: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// Jitter source that adds no noise. Tests use it to make sleeps exact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample_standard_normal(&mut self) -> f64 {
        0.0
    }
}

/// Per-operation retry bookkeeping.
///
/// `attempt` counts failed attempts so far. Created fresh per logical
/// submit call.
#[derive(Debug, Default, Clone)]
pub struct RetryState {
    pub attempt: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A bounded, jittered backoff policy.
///
/// Cheap to clone; all per-call state lives in [`RetryState`].
///
/// # Examples
///
/// ```rust
/// use tenure_core::retry::{NoJitter, RetryPolicy, RetryState};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed(Duration::from_millis(100)).with_max_attempts(3);
/// let mut state = RetryState::new();
/// let mut jitter = NoJitter;
///
/// assert!(policy.next_delay(&mut state, &mut jitter).is_some());
/// assert!(policy.next_delay(&mut state, &mut jitter).is_some());
/// assert!(policy.next_delay(&mut state, &mut jitter).is_none()); // budget spent
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    schedule: Arc<dyn BackoffSchedule>,
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// A fixed-delay policy with an unbounded attempt budget.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            schedule: Arc::new(FixedBackoff { delay }),
            max_attempts: None,
        }
    }

    /// A policy over an arbitrary schedule.
    pub fn with_schedule(schedule: impl BackoffSchedule + 'static) -> Self {
        Self {
            schedule: Arc::new(schedule),
            max_attempts: None,
        }
    }

    /// Bounds the total number of attempts (not sleeps: `n` attempts make
    /// at most `n - 1` sleeps).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Consumes one unit of retry budget.
    ///
    /// Increments `state.attempt`; returns `None` once the failed-attempt
    /// count reaches the configured maximum, signaling the caller to give
    /// up rather than sleep again. Otherwise returns the jittered delay,
    /// `max(0, d + noise * d / 4)` for the scheduled delay `d`.
    pub fn next_delay(
        &self,
        state: &mut RetryState,
        jitter: &mut dyn JitterSource,
    ) -> Option<Duration> {
        state.attempt += 1;
        if let Some(max) = self.max_attempts {
            if state.attempt >= max {
                return None;
            }
        }
        let scheduled = self.schedule.delay_for(state.attempt).as_secs_f64();
        let noisy = scheduled + jitter.sample_standard_normal() * scheduled / 4.0;
        Some(Duration::from_secs_f64(noisy.max(0.0)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(500))
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
