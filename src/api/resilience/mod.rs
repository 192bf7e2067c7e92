//! Retry and rate limiting for the HTTP transport

pub mod config;
pub mod rate_limiter;
pub mod retry;

pub use config::{AMOCRM_REQUESTS_PER_SECOND, RateLimitConfig, ResilienceConfig, ResilienceConfigBuilder};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use retry::{Disposition, RetryConfig, RetryPolicy};
