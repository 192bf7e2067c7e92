//! Webhook subscriptions

use super::constants::{self, Resource};
use super::error::ApiError;
use super::response;
use super::transport::{Account, Method, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// A webhook definition: the URL amoCRM calls and the events it is called for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub destination: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
}

impl Webhook {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            settings: Vec::new(),
            sort: None,
        }
    }

    /// Add events such as `add_lead` or `update_contact`
    pub fn on<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.extend(events.into_iter().map(Into::into));
        self
    }
}

#[derive(Clone)]
pub struct WebhookService {
    transport: Arc<dyn Transport>,
}

impl WebhookService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, account: &Account) -> Result<Vec<Value>, ApiError> {
        let path = Resource::Webhooks
            .path(None)
            .ok_or_else(|| ApiError::validation("webhooks path could not be resolved"))?;
        let response = self
            .transport
            .request(account, &path, Method::Get, json!({}))
            .await?;
        Ok(response::normalize(response.as_ref()))
    }

    pub async fn subscribe(&self, account: &Account, hooks: &[Webhook]) -> Result<Vec<Value>, ApiError> {
        self.post(account, &constants::webhooks_subscribe_path(), "subscribe", hooks)
            .await
    }

    pub async fn unsubscribe(&self, account: &Account, hooks: &[Webhook]) -> Result<Vec<Value>, ApiError> {
        self.post(account, &constants::webhooks_unsubscribe_path(), "unsubscribe", hooks)
            .await
    }

    async fn post(
        &self,
        account: &Account,
        path: &str,
        wrapper: &str,
        hooks: &[Webhook],
    ) -> Result<Vec<Value>, ApiError> {
        let hooks = serde_json::to_value(hooks).map_err(|source| ApiError::Serialization {
            resource: Resource::Webhooks.name().to_string(),
            source,
        })?;
        let mut params = serde_json::Map::new();
        params.insert(wrapper.to_string(), hooks);

        log::debug!("POST {} ({})", path, wrapper);
        let response = self
            .transport
            .request(account, path, Method::Post, Value::Object(params))
            .await?;
        Ok(response::normalize(response.as_ref()))
    }
}
