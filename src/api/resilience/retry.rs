//! Retrying failed wire calls
//!
//! Only failures the server may not repeat are retried: dropped connections, timeouts, 5xx
//! answers and 429. amoCRM counts requests per second, so a 429 waits at least
//! `rate_limit_pause` before the next attempt.

use crate::api::error::TransportError;
use log::{debug, warn};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Minimum wait after HTTP 429
    pub rate_limit_pause: Duration,
    /// Spread waits by ±50% so parallel clients do not retry in lockstep
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
            multiplier: 2.0,
            rate_limit_pause: Duration::from_secs(1),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_secs(1),
            rate_limit_pause: Duration::from_secs(2),
            ..Self::default()
        }
    }

    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            jitter: false,
            ..Self::default()
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Connection failure, timeout or 5xx
    Transient,
    /// HTTP 429
    Throttled,
    /// Bad request, missing credential, undecodable body
    Permanent,
}

impl Disposition {
    pub fn of(error: &TransportError) -> Self {
        match error {
            TransportError::Http { status, .. } => Self::of_status(*status),
            TransportError::Network { source, .. } => {
                if source.is_timeout() || source.is_connect() || source.is_request() {
                    Self::Transient
                } else {
                    source
                        .status()
                        .map(|status| Self::of_status(status.as_u16()))
                        .unwrap_or(Self::Permanent)
                }
            }
            TransportError::Auth(_) | TransportError::Decode { .. } => Self::Permanent,
        }
    }

    pub fn of_status(status: u16) -> Self {
        match status {
            429 => Self::Throttled,
            408 | 500..=599 => Self::Transient,
            _ => Self::Permanent,
        }
    }

    pub fn is_retryable(self) -> bool {
        self != Self::Permanent
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `attempt` until it succeeds, fails permanently or attempts run out
    pub async fn execute<F, Fut, T>(&self, attempt: F) -> Result<T, TransportError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut made = 0;

        loop {
            made += 1;
            let error = match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let disposition = Disposition::of(&error);
            if !disposition.is_retryable() || made >= max_attempts {
                if made > 1 {
                    warn!("Giving up after {} attempt(s): {}", made, error);
                }
                return Err(error);
            }

            let wait = self.wait_before(made + 1, disposition);
            warn!("Attempt {}/{} failed ({:?}), retrying in {:?}: {}", made, max_attempts, disposition, wait, error);
            tokio::time::sleep(wait).await;
        }
    }

    /// Wait before attempt number `next` (2 for the first retry)
    fn wait_before(&self, next: u32, disposition: Disposition) -> Duration {
        let exponent = next.saturating_sub(2) as i32;
        let backoff = self
            .config
            .initial_backoff
            .mul_f64(self.config.multiplier.max(1.0).powi(exponent))
            .min(self.config.max_backoff);

        let backoff = if self.config.jitter {
            backoff.mul_f64(rand::thread_rng().gen_range(0.5..=1.5))
        } else {
            backoff
        };

        let wait = match disposition {
            Disposition::Throttled => backoff.max(self.config.rate_limit_pause),
            _ => backoff,
        };
        debug!("Backoff before attempt {}: {:?}", next, wait);
        wait
    }
}
