//! Unsorted (incoming) leads: listing, accepting, declining and the summary

use super::constants::{self, Resource};
use super::error::ApiError;
use super::response;
use super::transport::{Account, Method, Transport};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct IncomingLeadService {
    transport: Arc<dyn Transport>,
}

impl IncomingLeadService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, account: &Account, params: Value) -> Result<Vec<Value>, ApiError> {
        let path = Resource::Unsorted
            .path(None)
            .ok_or_else(|| ApiError::validation("unsorted path could not be resolved"))?;
        let response = self.transport.request(account, &path, Method::Get, params).await?;
        Ok(response::normalize(response.as_ref()))
    }

    /// Counts of unsorted leads, as received
    pub async fn summary(&self, account: &Account, params: Value) -> Result<Option<Value>, ApiError> {
        let path = constants::unsorted_summary_path();
        Ok(self.transport.request(account, &path, Method::Get, params).await?)
    }

    /// Accept leads, e.g. `{"uids": [...], "user_id": 1, "status_id": 2}`
    pub async fn accept(&self, account: &Account, params: Value) -> Result<Vec<Value>, ApiError> {
        self.act(account, &constants::unsorted_accept_path(), params).await
    }

    pub async fn decline(&self, account: &Account, params: Value) -> Result<Vec<Value>, ApiError> {
        self.act(account, &constants::unsorted_decline_path(), params).await
    }

    async fn act(&self, account: &Account, path: &str, params: Value) -> Result<Vec<Value>, ApiError> {
        let response = self.transport.request(account, path, Method::Post, params).await?;
        Ok(action_items(response.as_ref()))
    }
}

/// Records of an accept/decline answer; older answers keep them under `data`
fn action_items(response: Option<&Value>) -> Vec<Value> {
    let items = response::normalize(response);
    if !items.is_empty() {
        return items;
    }
    match response.and_then(|body| body.get("data")) {
        Some(data) => response::records(Some(data)),
        None => response::records(response),
    }
}
