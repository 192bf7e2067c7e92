//! Wiring of config, credentials and services for one CLI invocation

use amocrm_sdk::api::{Account, BatchPlanner, EntityReader, HttpTransport, Transport, WebhookService};
use amocrm_sdk::auth::{
    AuthProvider, DatabaseTokenStore, FileTokenStore, OAuth2Auth, PermanentTokenAuth, TokenStore,
};
use amocrm_sdk::config::{AccountConfig, Config, TokenStorageConfig};
use anyhow::{Context, Result};
use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct Session {
    pub name: String,
    pub account: Account,
    pub config: Config,
    transport: Arc<dyn Transport>,
}

impl Session {
    pub async fn open(config: Config, account_name: Option<&str>) -> Result<Self> {
        let (name, account_config) = config.resolve_account(account_name)?;
        let auth = auth_provider(&config, &account_config).await?;
        let transport = HttpTransport::new(auth, config.settings.resilience())
            .context("Failed to build HTTP client")?;

        debug!("Opened session for account '{}'", name);
        Ok(Self {
            name,
            account: account_config.account(),
            config,
            transport: Arc::new(transport),
        })
    }

    pub fn reader(&self) -> EntityReader {
        EntityReader::new(self.transport.clone())
    }

    pub fn planner(&self) -> BatchPlanner {
        BatchPlanner::new(self.transport.clone())
            .with_options(self.config.settings.write_options())
            .with_updated_at_delta(self.config.settings.updated_at_delta)
    }

    pub fn webhooks(&self) -> WebhookService {
        WebhookService::new(self.transport.clone())
    }
}

/// Permanent token when one is configured, OAuth otherwise
async fn auth_provider(config: &Config, account: &AccountConfig) -> Result<Arc<dyn AuthProvider>> {
    if let Some(token) = &account.token {
        let auth = PermanentTokenAuth::new().with_token(&account.subdomain, token)?;
        return Ok(Arc::new(auth));
    }

    let oauth = account.oauth.as_ref().with_context(|| {
        format!(
            "Account '{}' has neither a token nor OAuth credentials",
            account.subdomain
        )
    })?;
    let store = open_token_store(config).await?;
    Ok(Arc::new(OAuth2Auth::new(oauth.into(), store)))
}

pub async fn open_token_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    match &config.settings.token_storage {
        TokenStorageConfig::File { .. } => {
            let dir = config.token_dir()?;
            debug!("Using token files in {:?}", dir);
            Ok(Arc::new(FileTokenStore::new(dir)))
        }
        TokenStorageConfig::Database {
            url,
            integration_code,
        } => {
            let store = DatabaseTokenStore::connect(url, integration_code.as_str())
                .await
                .with_context(|| format!("Failed to open token database {}", url))?;
            Ok(Arc::new(store))
        }
    }
}

/// `key=value` pairs into a flat parameter map; bracketed keys pass through unchanged
pub fn parse_params(pairs: &[String]) -> Result<Value> {
    let mut params = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid parameter '{}', expected KEY=VALUE", pair))?;
        params.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(Value::Object(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["with=contacts".to_string(), "filter[id]=5".to_string()]).unwrap();
        assert_eq!(params, json!({"with": "contacts", "filter[id]": "5"}));
        assert!(parse_params(&["broken".to_string()]).is_err());
    }
}
