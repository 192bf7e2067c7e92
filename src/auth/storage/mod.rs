//! Token persistence backends

pub mod database;
pub mod file;

pub use database::DatabaseTokenStore;
pub use file::FileTokenStore;

use super::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Stores the token blob of each account domain (e.g. `acme.amocrm.ru`)
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, tokens: &Value, domain: &str) -> Result<(), StorageError>;

    /// `StorageError::NotFound` when nothing is stored for the domain
    async fn load(&self, domain: &str) -> Result<Value, StorageError>;

    /// Whether the integration was authorized for the domain
    async fn has_tokens(&self, domain: &str) -> Result<bool, StorageError>;
}

#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    async fn save(&self, tokens: &Value, domain: &str) -> Result<(), StorageError> {
        (**self).save(tokens, domain).await
    }

    async fn load(&self, domain: &str) -> Result<Value, StorageError> {
        (**self).load(domain).await
    }

    async fn has_tokens(&self, domain: &str) -> Result<bool, StorageError> {
        (**self).has_tokens(domain).await
    }
}
