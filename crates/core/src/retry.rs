//! Retry policy building blocks
//!
//! Transport-agnostic pieces of the client's retry behaviour:
//! - Exponential backoff with jitter, bounded by a min/max wait
//! - `Retry-After` handling for throttled and unavailable responses
//! - The status-code table deciding which responses are worth retrying
//!
//! # Example
//!
//! ```rust
//! use opsgenie_core::retry::{is_retryable_status, BackoffConfig};
//! use std::time::Duration;
//!
//! let backoff = BackoffConfig::new(Duration::from_millis(100), Duration::from_secs(2));
//! assert!(backoff.delay_for_attempt(3) <= Duration::from_secs(2));
//! assert!(is_retryable_status(503));
//! assert!(!is_retryable_status(501));
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retries allowed when the configured count is zero
pub const DEFAULT_RETRY_COUNT: u32 = 4;

/// Default lower bound for the wait between attempts
pub const DEFAULT_RETRY_WAIT_MIN: Duration = Duration::from_secs(1);

/// Default upper bound for the wait between attempts
pub const DEFAULT_RETRY_WAIT_MAX: Duration = Duration::from_secs(30);

/// Largest exponent applied to the minimum wait
const MAX_EXPONENT: u32 = 32;

/// Exponential backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Wait before the first retry
    pub min_wait: Duration,
    /// Upper bound for any single wait
    pub max_wait: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Add up to 25% random jitter to delays
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_wait: DEFAULT_RETRY_WAIT_MIN,
            max_wait: DEFAULT_RETRY_WAIT_MAX,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl BackoffConfig {
    /// Create a jittered exponential backoff between `min_wait` and `max_wait`
    #[must_use]
    pub fn new(min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            min_wait,
            max_wait,
            ..Self::default()
        }
    }

    /// Same bounds, deterministic delays
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Calculate the delay before retry number `attempt` (zero-based)
    ///
    /// The delay is `min_wait * multiplier^attempt`, optionally jittered, and
    /// never exceeds `max_wait`. Bounds too large to round-trip through `f64`
    /// seconds yield `max_wait`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let max_secs = self.max_wait.as_secs_f64();
        let min_secs = self.min_wait.as_secs_f64();
        if min_secs == 0.0 || max_secs == 0.0 {
            return Duration::ZERO;
        }

        let exponent = attempt.min(MAX_EXPONENT) as i32;
        let base = (min_secs * self.multiplier.powi(exponent)).min(max_secs);

        let delay = if self.jitter {
            let factor = 1.0 + rand::thread_rng().gen_range(0.0..0.25);
            (base * factor).min(max_secs)
        } else {
            base
        };

        Duration::try_from_secs_f64(delay).map_or(self.max_wait, |d| d.min(self.max_wait))
    }
}

/// Server-requested wait carried by a `Retry-After` header
///
/// Only honoured for 429 (Too Many Requests) and 503 (Service Unavailable),
/// and only in its delta-seconds form.
pub fn retry_after(status: u16, header: Option<&str>) -> Option<Duration> {
    if status != 429 && status != 503 {
        return None;
    }
    header
        .map(str::trim)
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Whether a response status warrants another attempt
///
/// 5xx responses are usually transient, except 501 which means the endpoint
/// will never work. Status 0 and out-of-range codes are treated as server
/// trouble as well. 429 is retried so the backoff can wait out the throttle.
pub fn is_retryable_status(status: u16) -> bool {
    status == 0 || status == 429 || (status >= 500 && status != 501)
}
