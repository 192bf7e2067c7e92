//! amoCRM REST API v4
//!
//! Writes go through [`BatchPlanner`], reads through [`EntityReader`]; webhooks and unsorted
//! leads have their own small services. Every service sends its requests through a shared
//! [`Transport`] and takes the target [`Account`] per call.

pub mod constants;
pub mod error;
pub mod incoming;
pub mod lock;
pub mod models;
pub mod operations;
pub mod reader;
pub mod resilience;
pub mod response;
pub mod transport;
pub mod webhooks;

pub use constants::{EntityType, Resource};
pub use error::{ApiError, TransportError};
pub use incoming::IncomingLeadService;
pub use lock::{EntityKey, EntityLockGuard, EntityLocks};
pub use operations::{BatchOutput, BatchPlanner, ResponseMode, WriteKind, WriteOptions};
pub use reader::EntityReader;
pub use resilience::{RateLimitConfig, RateLimiter, ResilienceConfig, RetryConfig, RetryPolicy};
pub use response::extract_items;
pub use transport::{Account, HttpTransport, Method, Transport};
pub use webhooks::{Webhook, WebhookService};
