//! Per-account token buckets
//!
//! amoCRM counts requests per account, so every account domain gets its own bucket and a
//! busy account never slows down another one served by the same transport.

use super::config::RateLimitConfig;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Bucket {
    fn full(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            refilled_at: Instant::now(),
        }
    }

    fn refill(&mut self, per_second: f64, capacity: f64) {
        let now = Instant::now();
        let earned = now.duration_since(self.refilled_at).as_secs_f64() * per_second;
        if earned > 0.0 {
            self.tokens = (self.tokens + earned).min(capacity);
            self.refilled_at = now;
        }
    }

    /// Time until one token is available
    fn deficit(&self, per_second: f64) -> Duration {
        Duration::from_secs_f64(((1.0 - self.tokens) / per_second).max(0.0))
    }
}

#[derive(Debug, Default)]
struct Counters {
    granted: u64,
    delayed: u64,
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, Bucket>,
    counters: Counters,
}

/// Shared by clones; one bucket per account domain
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<State>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Wait until the account may send another request
    pub async fn acquire(&self, domain: &str) {
        loop {
            match self.reserve(domain) {
                None => return,
                Some(wait) => {
                    debug!("{} is over its request rate, waiting {:?}", domain, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Take a token without waiting
    pub fn try_acquire(&self, domain: &str) -> bool {
        self.reserve(domain).is_none()
    }

    pub fn stats(&self) -> RateLimiterStats {
        let state = self.state();
        RateLimiterStats {
            accounts: state.buckets.len(),
            requests_granted: state.counters.granted,
            requests_delayed: state.counters.delayed,
            enabled: self.config.enabled,
        }
    }

    /// `None` when a token was taken, otherwise how long to wait
    fn reserve(&self, domain: &str) -> Option<Duration> {
        if !self.config.enabled {
            return None;
        }

        let per_second = f64::from(self.config.requests_per_second.max(1));
        let capacity = f64::from(self.config.burst.max(1));

        let mut state = self.state();
        let bucket = state
            .buckets
            .entry(domain.to_string())
            .or_insert_with(|| Bucket::full(capacity));
        bucket.refill(per_second, capacity);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            state.counters.granted += 1;
            None
        } else {
            let wait = bucket.deficit(per_second);
            state.counters.delayed += 1;
            Some(wait)
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterStats {
    /// Account domains seen so far
    pub accounts: usize,
    pub requests_granted: u64,
    /// Attempts that found their bucket empty
    pub requests_delayed: u64,
    pub enabled: bool,
}
