//! Retry policy with exponential backoff.
//!
//! The delay formula and the set of retry-eligible status codes match the
//! platform's published client behavior: `1000 * 2^(3 - retries_remaining)`
//! milliseconds plus uniform jitter in [-250, +250], floored at zero.

use rand::Rng;
use std::time::Duration;

/// Backoff policy for the request pipeline.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    jitter_ms: f64,
}

impl RetryPolicy {
    /// Base delay component in milliseconds.
    pub const BASE_DELAY_MS: f64 = 1000.0;
    /// Default jitter half-range in milliseconds.
    pub const DEFAULT_JITTER_MS: f64 = 250.0;
    /// Default number of retries after the first attempt.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Create a policy with the given retry budget and default jitter.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            jitter_ms: Self::DEFAULT_JITTER_MS,
        }
    }

    /// Create a policy with jitter disabled.
    ///
    /// Delays become exact, which is what backoff tests assert against.
    pub fn without_jitter(max_retries: u32) -> Self {
        Self {
            max_retries,
            jitter_ms: 0.0,
        }
    }

    /// The retry budget (attempts after the first).
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Check if a status code is eligible for retry.
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    /// Delay before the next attempt, given how many retries remain.
    ///
    /// With the default budget of 3 this yields base components of
    /// 1000ms, 2000ms and 4000ms across the three retries.
    pub fn delay_for_remaining(&self, retries_remaining: u32) -> Duration {
        let exponent = 3 - retries_remaining as i32;
        let base = Self::BASE_DELAY_MS * 2f64.powi(exponent);
        let jitter = if self.jitter_ms > 0.0 {
            rand::thread_rng().gen_range(-self.jitter_ms..=self.jitter_ms)
        } else {
            0.0
        };
        Duration::from_millis((base + jitter).round().max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_sequence_without_jitter() {
        let policy = RetryPolicy::without_jitter(3);

        assert_eq!(policy.delay_for_remaining(3), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_remaining(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_remaining(1), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_with_jitter_stays_in_band() {
        let policy = RetryPolicy::new(3);

        for _ in 0..100 {
            let delay = policy.delay_for_remaining(3).as_millis() as i64;
            assert!((750..=1250).contains(&delay), "delay {delay} out of band");

            let delay = policy.delay_for_remaining(1).as_millis() as i64;
            assert!((3750..=4250).contains(&delay), "delay {delay} out of band");
        }
    }

    #[test]
    fn test_delay_floored_at_zero() {
        // A budget above 3 pushes the exponent negative; jitter must never
        // drive the result below zero.
        let policy = RetryPolicy::new(6);
        for _ in 0..100 {
            let _ = policy.delay_for_remaining(6);
        }
    }

    #[test]
    fn test_retryable_status_set() {
        assert!(RetryPolicy::is_retryable_status(429));
        assert!(RetryPolicy::is_retryable_status(500));
        assert!(RetryPolicy::is_retryable_status(502));
        assert!(RetryPolicy::is_retryable_status(503));
        assert!(RetryPolicy::is_retryable_status(504));
        assert!(!RetryPolicy::is_retryable_status(200));
        assert!(!RetryPolicy::is_retryable_status(400));
        assert!(!RetryPolicy::is_retryable_status(401));
        assert!(!RetryPolicy::is_retryable_status(404));
        assert!(!RetryPolicy::is_retryable_status(422));
        assert!(!RetryPolicy::is_retryable_status(501));
    }
}
