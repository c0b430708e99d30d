//! Wait Mechanisms
//!
//! Bounded poll-until loops with exponential backoff. Every suspension point
//! in a smoke run goes through [`Waiter::poll_until`], so the upper bound of
//! each wait is explicit and visible in the step definition instead of being
//! hidden in an arbitrary sleep.

use crate::result::{SmokeError, SmokeResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default first polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default growth factor between polls
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.5;

/// Default ceiling for a single polling interval (1 second)
pub const DEFAULT_MAX_POLL_INTERVAL_MS: u64 = 1_000;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// First polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Multiplier applied to the interval after each unsuccessful poll
    pub backoff_factor: f64,
    /// Upper bound for a single interval in milliseconds
    pub max_poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_poll_interval_ms: DEFAULT_MAX_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set timeout in whole seconds
    #[must_use]
    pub const fn with_timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout_ms = seconds.saturating_mul(1000);
        self
    }

    /// Set the first polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the backoff factor
    #[must_use]
    pub const fn with_backoff(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the interval ceiling in milliseconds
    #[must_use]
    pub const fn with_max_poll_interval(mut self, max_ms: u64) -> Self {
        self.max_poll_interval_ms = max_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get first poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Interval sequence these options produce
    #[must_use]
    pub fn schedule(&self) -> PollSchedule {
        PollSchedule::new(
            self.poll_interval(),
            self.backoff_factor,
            Duration::from_millis(self.max_poll_interval_ms),
        )
    }
}

// =============================================================================
// POLL SCHEDULE
// =============================================================================

/// Endless sequence of polling intervals: `first, first*f, first*f², ...`
/// capped at `max`.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    next: Duration,
    factor: f64,
    max: Duration,
}

impl PollSchedule {
    /// Create a schedule. Factors below 1 (or not finite) mean a fixed interval.
    #[must_use]
    pub fn new(first: Duration, factor: f64, max: Duration) -> Self {
        let factor = if factor.is_finite() && factor >= 1.0 {
            factor
        } else {
            1.0
        };
        let max = max.max(first);
        Self {
            next: first,
            factor,
            max,
        }
    }
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        let grown = (current.as_secs_f64() * self.factor).min(self.max.as_secs_f64());
        self.next = Duration::from_secs_f64(grown);
        Some(current)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the condition was met before the timeout
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was checked
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, attempts: u32, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            attempts,
            waited_for: waited_for.into(),
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, attempts: u32, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            elapsed,
            attempts,
            waited_for: waited_for.into(),
        }
    }

    /// Turn an unsuccessful wait into [`SmokeError::Timeout`]
    pub fn into_result(self, timeout_ms: u64) -> SmokeResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(SmokeError::Timeout { ms: timeout_ms })
        }
    }
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Waiter for synchronization with the remote application
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options this waiter uses
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `predicate` until it returns `true` or the timeout elapses.
    ///
    /// The predicate is checked once immediately and once more after the
    /// final sleep, so a zero timeout still performs a single check.
    /// Errors from the predicate abort the wait and are returned as-is.
    pub fn poll_until<F>(&self, description: &str, mut predicate: F) -> SmokeResult<WaitResult>
    where
        F: FnMut() -> SmokeResult<bool>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let mut schedule = self.options.schedule();
        let mut attempts = 0_u32;

        loop {
            attempts = attempts.saturating_add(1);
            if predicate()? {
                let elapsed = start.elapsed();
                debug!(waited_for = description, ?elapsed, attempts, "wait satisfied");
                return Ok(WaitResult::success(elapsed, attempts, description));
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                debug!(waited_for = description, ?elapsed, attempts, "wait timed out");
                return Ok(WaitResult::timeout(elapsed, attempts, description));
            }

            let remaining = timeout - elapsed;
            let interval = schedule
                .next()
                .unwrap_or_else(|| self.options.poll_interval())
                .min(remaining);
            std::thread::sleep(interval);
        }
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Wait for a condition with default polling, failing with
/// [`SmokeError::Timeout`] when it never holds
pub fn wait_until<F>(predicate: F, timeout_ms: u64) -> SmokeResult<()>
where
    F: FnMut() -> bool,
{
    let mut predicate = predicate;
    let waiter = Waiter::with_options(WaitOptions::new().with_timeout(timeout_ms));
    waiter
        .poll_until("custom condition", || Ok(predicate()))?
        .into_result(timeout_ms)?;
    Ok(())
}

/// Wait for a fixed duration (discouraged - use wait conditions instead)
pub fn wait_timeout(duration_ms: u64) {
    std::thread::sleep(Duration::from_millis(duration_ms));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::Cell;

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
            assert_eq!(opts.backoff_factor, DEFAULT_BACKOFF_FACTOR);
            assert_eq!(opts.max_poll_interval_ms, DEFAULT_MAX_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_chained() {
            let opts = WaitOptions::new()
                .with_timeout_secs(60)
                .with_poll_interval(10)
                .with_backoff(2.0)
                .with_max_poll_interval(80);
            assert_eq!(opts.timeout(), Duration::from_secs(60));
            assert_eq!(opts.poll_interval(), Duration::from_millis(10));
            assert_eq!(opts.backoff_factor, 2.0);
            assert_eq!(opts.max_poll_interval_ms, 80);
        }
    }

    mod schedule_tests {
        use super::*;

        #[test]
        fn test_schedule_grows_and_caps() {
            let intervals: Vec<u128> = WaitOptions::new()
                .with_poll_interval(10)
                .with_backoff(2.0)
                .with_max_poll_interval(50)
                .schedule()
                .take(6)
                .map(|d| d.as_millis())
                .collect();
            assert_eq!(intervals, vec![10, 20, 40, 50, 50, 50]);
        }

        #[test]
        fn test_schedule_factor_below_one_is_fixed() {
            let schedule = PollSchedule::new(
                Duration::from_millis(25),
                0.5,
                Duration::from_millis(1000),
            );
            assert!(schedule.take(4).all(|d| d == Duration::from_millis(25)));
        }

        #[test]
        fn test_schedule_nan_factor_is_fixed() {
            let mut schedule =
                PollSchedule::new(Duration::from_millis(5), f64::NAN, Duration::from_millis(5));
            assert_eq!(schedule.nth(3), Some(Duration::from_millis(5)));
        }

        #[test]
        fn test_schedule_max_below_first_keeps_first() {
            let mut schedule =
                PollSchedule::new(Duration::from_millis(30), 2.0, Duration::from_millis(10));
            assert_eq!(schedule.next(), Some(Duration::from_millis(30)));
            assert_eq!(schedule.next(), Some(Duration::from_millis(30)));
        }
    }

    mod waiter_tests {
        use super::*;

        fn fast_waiter(timeout_ms: u64) -> Waiter {
            Waiter::with_options(
                WaitOptions::new()
                    .with_timeout(timeout_ms)
                    .with_poll_interval(1)
                    .with_backoff(1.0),
            )
        }

        #[test]
        fn test_immediate_success_single_attempt() {
            let result = fast_waiter(100).poll_until("ready", || Ok(true)).unwrap();
            assert!(result.success);
            assert_eq!(result.attempts, 1);
            assert_eq!(result.waited_for, "ready");
        }

        #[test]
        fn test_condition_becomes_true() {
            let calls = Cell::new(0);
            let result = fast_waiter(2_000)
                .poll_until("third poll", || {
                    calls.set(calls.get() + 1);
                    Ok(calls.get() >= 3)
                })
                .unwrap();
            assert!(result.success);
            assert_eq!(result.attempts, 3);
        }

        #[test]
        fn test_timeout_reports_failure() {
            let result = fast_waiter(20).poll_until("never", || Ok(false)).unwrap();
            assert!(!result.success);
            assert!(result.elapsed >= Duration::from_millis(20));
            assert!(result.attempts >= 2);
        }

        #[test]
        fn test_zero_timeout_checks_once() {
            let result = fast_waiter(0).poll_until("once", || Ok(false)).unwrap();
            assert!(!result.success);
            assert_eq!(result.attempts, 1);
        }

        #[test]
        fn test_predicate_error_propagates() {
            let err = fast_waiter(1_000)
                .poll_until("broken", || Err(SmokeError::connection("lost")))
                .unwrap_err();
            assert!(matches!(err, SmokeError::ConnectionError { .. }));
        }

        #[test]
        fn test_into_result_timeout() {
            let result = WaitResult::timeout(Duration::from_millis(5), 2, "x");
            let err = result.into_result(5).unwrap_err();
            assert!(matches!(err, SmokeError::Timeout { ms: 5 }));
        }
    }

    mod convenience_tests {
        use super::*;

        #[test]
        fn test_wait_until_success() {
            assert!(wait_until(|| true, 100).is_ok());
        }

        #[test]
        fn test_wait_until_timeout() {
            let err = wait_until(|| false, 10).unwrap_err();
            assert!(matches!(err, SmokeError::Timeout { ms: 10 }));
        }

        #[test]
        fn test_wait_timeout_sleeps() {
            let start = Instant::now();
            wait_timeout(5);
            assert!(start.elapsed() >= Duration::from_millis(5));
        }
    }
}
