//! Exponential backoff for capacity errors.
//!
//! Every call gets its own [`ExponentialBackoff`] built from a shared
//! [`BackoffConfig`], so retry budgets never leak between operations or pages.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;

use crate::store::{StoreError, StoreResult};

/// Parameters of the exponential backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Growth factor applied after each retry.
    pub multiplier: f64,
    /// Jitter as a fraction of the interval, in `[0, 1]`.
    pub randomization_factor: f64,
    /// Upper bound for a single delay.
    pub max_interval: Duration,
    /// Give up once this much time would have passed since the first attempt.
    pub max_elapsed_time: Duration,
    /// Give up after this many attempts, including the first.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(15 * 60),
            max_attempts: None,
        }
    }
}

impl BackoffConfig {
    /// Millisecond-scale schedule without jitter, for tests and local stores.
    pub fn fast() -> Self {
        Self {
            initial_interval: Duration::from_millis(1),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_interval: Duration::from_millis(10),
            max_elapsed_time: Duration::from_secs(1),
            max_attempts: None,
        }
    }

    /// Starts a fresh schedule.
    pub fn start(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            config: self.clone(),
            started: Instant::now(),
            attempts: 0,
        }
    }
}

/// Retry state for a single call.
#[derive(Debug)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    current_interval: Duration,
    started: Instant,
    attempts: u32,
}

impl ExponentialBackoff {
    /// Records a failed attempt and returns how long to wait before the next one,
    /// or `None` when the schedule gives up.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if let Some(max) = self.config.max_attempts {
            if self.attempts >= max {
                return None;
            }
        }

        let delay = randomize(self.current_interval, self.config.randomization_factor);
        if self.started.elapsed().saturating_add(delay) > self.config.max_elapsed_time {
            return None;
        }

        self.current_interval = grow(
            self.current_interval,
            self.config.multiplier,
            self.config.max_interval,
        );
        Some(delay)
    }

    /// Failed attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Next interval, capped at `max`. Products that overflow a `Duration` land on the cap.
fn grow(interval: Duration, multiplier: f64, max: Duration) -> Duration {
    let secs = interval.as_secs_f64() * multiplier.max(1.0);
    Duration::try_from_secs_f64(secs).map_or(max, |next| next.min(max))
}

fn randomize(interval: Duration, factor: f64) -> Duration {
    if factor.is_nan() || factor <= 0.0 {
        return interval;
    }
    let secs = interval.as_secs_f64();
    let delta = secs * factor.min(1.0);
    let jittered = rand::rng().random_range((secs - delta)..=(secs + delta));
    Duration::try_from_secs_f64(jittered).unwrap_or(interval)
}

/// Why [`retry`] stopped without a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// A non-retriable error, returned on first occurrence.
    #[error("{0}")]
    Terminal(StoreError),
    /// The schedule gave up while the store kept reporting capacity errors.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: StoreError },
}

/// Runs `attempt` until it succeeds, fails terminally, or the backoff gives up.
///
/// Only errors whose kind is retriable are retried; the delay between
/// attempts is slept on the tokio timer.
pub async fn retry<T, F, Fut>(config: &BackoffConfig, mut attempt: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut backoff = config.start();

    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retriable() => return Err(RetryError::Terminal(err)),
            Err(err) => err,
        };

        match backoff.next_backoff() {
            Some(delay) => {
                tracing::warn!(
                    attempt = backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    code = %err.code,
                    "Capacity exceeded, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                return Err(RetryError::Exhausted {
                    attempts: backoff.attempts(),
                    last: err,
                })
            }
        }
    }
}
