//! Retry policy shared by every network-edge send call: retries on network
//! errors and on 5xx (plus an optional extra status set), with exponential
//! backoff supplied by [`Backoff`].
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::Error;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(250),
            multiplier: 1.0,
            max_interval: Duration::from_millis(250),
            jitter_fraction: 0.0,
        }
    }
}

/// An exponential backoff schedule: `initial * multiplier^attempt`, capped
/// at `max_interval`, with up to `jitter_fraction` of random jitter added.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    policy: RetryPolicy,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn interval_for(&self, attempt: u32) -> Duration {
        let base = self.policy.initial_interval.as_secs_f64() * self.policy.multiplier.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        let capped = base.min(self.policy.max_interval.as_secs_f64());
        let jitter = capped * self.policy.jitter_fraction * rand::thread_rng().gen_range(-1.0..=1.0);
        Duration::from_secs_f64((capped + jitter).max(0.0))
    }
}

/// Retries `send` according to `policy`, treating network errors and 5xx as
/// retryable; everything else returns immediately.
pub async fn send_with_retry<T, F, Fut>(policy: RetryPolicy, mut send: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Error>>,
{
    let backoff = Backoff::new(policy);
    let mut last_err = None;

    for attempt in 0..policy.max_attempts {
        match send().await {
            Ok(value) => return Ok(value),
            Err(err @ (Error::Network { .. } | Error::Status5xx { .. })) => {
                warn!(attempt, "retryable error, backing off: {err}");
                last_err = Some(err);
                tokio::time::sleep(backoff.interval_for(attempt)).await;
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.expect("loop runs at least once since max_attempts >= 1"))
}
