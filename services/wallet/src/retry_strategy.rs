use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

use crate::errors::RateError;

pub struct RetryStrategy {
    max_retries: u32,
    initial_interval: Duration,
    max_elapsed: Duration,
}

impl RetryStrategy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_interval: Duration::from_millis(500),
            max_elapsed: Duration::from_secs(30),
        }
    }

    /// Shorter intervals, for tests and fast local refresh cycles.
    pub fn with_intervals(mut self, initial_interval: Duration, max_elapsed: Duration) -> Self {
        self.initial_interval = initial_interval;
        self.max_elapsed = max_elapsed;
        self
    }

    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_elapsed / 2)
            .with_multiplier(2.0)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Transient provider failures are worth another attempt; bad data is not.
    pub fn is_retryable_error(&self, error: &RateError) -> bool {
        match error {
            RateError::Unavailable(_) | RateError::Timeout(_) => true,
            RateError::Malformed(_) => false,
        }
    }
}
