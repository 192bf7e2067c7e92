//! Retry and rate limit settings of one transport

use super::retry::RetryConfig;

/// amoCRM rejects an account's requests above this rate with HTTP 429
pub const AMOCRM_REQUESTS_PER_SECOND: u32 = 7;

#[derive(Debug, Clone, Default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
}

/// Per-account token bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    /// Requests an idle account may send back to back
    pub burst: u32,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_second(AMOCRM_REQUESTS_PER_SECOND)
    }
}

impl RateLimitConfig {
    /// Steady rate with a burst of one second's worth of requests
    pub fn per_second(requests: u32) -> Self {
        let requests = requests.max(1);
        Self {
            requests_per_second: requests,
            burst: requests,
            enabled: true,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl ResilienceConfig {
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::default()
    }

    /// For accounts shared with other integrations: half the rate, fewer retries
    pub fn conservative() -> Self {
        Self {
            retry: RetryConfig::conservative(),
            rate_limit: RateLimitConfig::per_second(AMOCRM_REQUESTS_PER_SECOND / 2),
        }
    }

    /// Single attempt, no throttling
    pub fn disabled() -> Self {
        Self {
            retry: RetryConfig::none(),
            rate_limit: RateLimitConfig::unlimited(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Total attempts per request, the first one included
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn rate_limit_config(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    pub fn requests_per_second(mut self, requests: u32) -> Self {
        self.config.rate_limit = RateLimitConfig {
            enabled: self.config.rate_limit.enabled,
            ..RateLimitConfig::per_second(requests)
        };
        self
    }

    pub fn rate_limited(mut self, enabled: bool) -> Self {
        self.config.rate_limit.enabled = enabled;
        self
    }

    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}
