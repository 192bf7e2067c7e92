//! Wire calls to the amoCRM REST API

use super::constants::{self, headers};
use super::error::TransportError;
use super::resilience::{RateLimiter, ResilienceConfig, RetryPolicy};
use crate::auth::AuthProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The account a call is made against. Passed explicitly to every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account {
    pub subdomain: String,
    pub domain: String,
    base_url: Option<String>,
}

impl Account {
    pub fn new(subdomain: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            domain: constants::DEFAULT_DOMAIN.to_string(),
            base_url: None,
        }
    }

    /// Use another top-level domain, e.g. `kommo.com`
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Send requests to a fixed base URL instead of `https://{subdomain}.{domain}`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// `subdomain.domain`; the key tokens are stored under
    pub fn full_domain(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }

    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => constants::base_url(&self.subdomain, &self.domain),
        }
    }
}

/// One request, one decoded response. `Ok(None)` means the server sent no content.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        account: &Account,
        path: &str,
        method: Method,
        params: Value,
    ) -> Result<Option<Value>, TransportError>;
}

/// reqwest transport with bearer auth, retries and a shared rate limit
pub struct HttpTransport {
    client: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl HttpTransport {
    pub fn new(auth: Arc<dyn AuthProvider>, resilience: ResilienceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(headers::USER_AGENT)
            .build()?;

        Ok(Self::with_client(auth, client, resilience))
    }

    pub fn with_client(
        auth: Arc<dyn AuthProvider>,
        client: reqwest::Client,
        resilience: ResilienceConfig,
    ) -> Self {
        Self {
            client,
            auth,
            retry: RetryPolicy::new(resilience.retry),
            limiter: RateLimiter::new(resilience.rate_limit),
        }
    }

    async fn send_once(
        &self,
        account: &Account,
        path: &str,
        method: Method,
        params: &Value,
    ) -> Result<Option<Value>, TransportError> {
        self.limiter.acquire(&account.full_domain()).await;
        let token = self.auth.access_token(account).await?;
        let url = format!("{}{}", account.base_url(), path);

        log::debug!("{} {}", method, url);

        let builder = match method {
            Method::Get => self.client.get(&url).query(&query_pairs(params)),
            Method::Post => self.client.post(&url).json(params),
            Method::Patch => self.client.patch(&url).json(params),
            Method::Delete => self.client.delete(&url).json(params),
        };

        let response = builder
            .bearer_auth(token)
            .header("Accept", headers::CONTENT_TYPE_HAL_JSON)
            .send()
            .await
            .map_err(|source| TransportError::Network {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Network {
                path: path.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(TransportError::Http {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        if status == reqwest::StatusCode::NO_CONTENT || body.trim().is_empty() {
            log::debug!("{} {} returned no content", method, path);
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| TransportError::Decode {
                path: path.to_string(),
                source,
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        account: &Account,
        path: &str,
        method: Method,
        params: Value,
    ) -> Result<Option<Value>, TransportError> {
        self.retry
            .execute(|| self.send_once(account, path, method, &params))
            .await
    }
}

/// Flatten params into bracketed query pairs: `filter[id][0]=1&with=contacts`
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn flatten_into(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(format!("{}[{}]", prefix, key), nested, pairs);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_into(format!("{}[{}]", prefix, index), nested, pairs);
            }
        }
        Value::String(text) => pairs.push((prefix, text.clone())),
        Value::Bool(flag) => pairs.push((prefix, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => pairs.push((prefix, number.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_urls() {
        let account = Account::new("acme");
        assert_eq!(account.full_domain(), "acme.amocrm.ru");
        assert_eq!(account.base_url(), "https://acme.amocrm.ru");

        let kommo = Account::new("acme").with_domain("kommo.com");
        assert_eq!(kommo.base_url(), "https://acme.kommo.com");

        let local = Account::new("acme").with_base_url("http://127.0.0.1:8080/");
        assert_eq!(local.base_url(), "http://127.0.0.1:8080");
        assert_eq!(local.full_domain(), "acme.amocrm.ru");
    }

    #[test]
    fn test_query_pairs_flatten_nested_params() {
        let pairs = query_pairs(&json!({
            "with": "contacts",
            "limit": 50,
            "filter": {"id": [1, 2]},
            "skip": null
        }));

        assert!(pairs.contains(&("with".to_string(), "contacts".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "50".to_string())));
        assert!(pairs.contains(&("filter[id][0]".to_string(), "1".to_string())));
        assert!(pairs.contains(&("filter[id][1]".to_string(), "2".to_string())));
        assert_eq!(pairs.len(), 4);
    }
}
