// ABOUTME: Retry policy for the validation stage.
// ABOUTME: Exponential backoff with a bounded number of retries.

use serde::Deserialize;
use std::time::Duration;

/// How often and how long to wait before validating a service again.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay", with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(default = "default_backoff_rate")]
    pub backoff_rate: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_rate() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay: default_initial_delay(),
            backoff_rate: default_backoff_rate(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), or `None` once retries are exhausted.
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        Some(self.initial_delay.mul_f64(self.backoff_rate.powi(exponent)))
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.backoff_rate.is_finite() && self.backoff_rate >= 1.0
    }
}
