//! Explicit call wrappers: retry with backoff and timing.
//!
//! Callers build a [`RetryPolicy`] (usually from settings) and pass the
//! operation as a closure, so the policy is visible where the call is made.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::AppResult;

/// Upper bound for the delay between two attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retry with exponential backoff for retryable [`crate::error::AppError`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(100),
            backoff: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(max_attempts: u32, initial_delay: Duration, backoff: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff: backoff.max(1.0),
        }
    }

    /// Policy described by `files.retry.*`.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self::new(
            settings
                .get_u64("files.retry.max_attempts")
                .map(|n| n.min(u64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.max_attempts),
            settings
                .get_u64("files.retry.delay_ms")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            settings
                .get_f64("files.retry.backoff")
                .unwrap_or(defaults.backoff),
        )
    }

    /// Delay after `delay`, grown by the backoff factor and capped at
    /// [`MAX_RETRY_DELAY`].
    pub fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff)
            .map_or(MAX_RETRY_DELAY, |next| next.min(MAX_RETRY_DELAY))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are exhausted. The last error is returned.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> AppResult<T>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        "{} attempt {} failed: {}. Retrying in {:.2}s",
                        label,
                        attempt,
                        e,
                        delay.as_secs_f64()
                    );
                    std::thread::sleep(delay);
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 1 {
                        warn!("{} failed after {} attempts: {}", label, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Run `op`, log how long it took, and hand back the value with the duration.
pub fn timed<T, F>(label: &str, op: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = op();
    let elapsed = start.elapsed();
    debug!("{} executed in {:.4}s", label, elapsed.as_secs_f64());
    (value, elapsed)
}

/// [`timed`] for fallible operations; failures are logged with their duration.
pub fn timed_result<T, F>(label: &str, op: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T>,
{
    let (result, elapsed) = timed(label, op);
    if let Err(ref e) = result {
        debug!("{} failed after {:.4}s: {}", label, elapsed.as_secs_f64(), e);
    }
    result
}
