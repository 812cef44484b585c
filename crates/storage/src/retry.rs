#![forbid(unsafe_code)]

use crate::StoreError;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_UNIT: Duration = Duration::from_millis(50);

/// Bounded linear-backoff retry for transient storage contention.
///
/// An operation runs at most `max_retries + 1` times. Retry `i` (1-based)
/// sleeps `unit * i` first. Only [`StoreError::is_transient`] failures are
/// retried; anything else is returned as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_UNIT)
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, unit: Duration) -> Self {
        Self { max_retries, unit }
    }

    pub const fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    pub fn delay_before(&self, retry: u32) -> Duration {
        self.unit.saturating_mul(retry)
    }

    pub fn run<T>(
        &self,
        op: &str,
        mut attempt: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            match attempt() {
                Err(err) if err.is_transient() => {
                    if attempts > self.max_retries {
                        log::debug!("{op}: giving up after {attempts} attempt(s)");
                        return Err(with_attempts(err, attempts));
                    }
                    let delay = self.delay_before(attempts);
                    log::debug!("{op}: storage busy, retry {attempts} in {delay:?}");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                other => return other,
            }
        }
    }
}

fn with_attempts(err: StoreError, attempts: u32) -> StoreError {
    match err {
        StoreError::StorageContention { op, source, .. } => StoreError::StorageContention {
            op,
            attempts,
            source,
        },
        other => other,
    }
}
