//! OAuth2 authorization-code flow with refresh and persisted tokens

use super::provider::AuthProvider;
use super::storage::TokenStore;
use super::{AuthError, StorageError};
use crate::api::transport::Account;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Tokens are refreshed this many seconds before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Integration credentials from the amoCRM integration settings
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Token pair as returned by `/oauth2/access_token`, plus the time it was received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub received_at: i64,
}

impl OAuthTokens {
    pub fn expires_at(&self) -> i64 {
        self.received_at + self.expires_in
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at() - EXPIRY_MARGIN_SECS <= now
    }
}

pub struct OAuth2Auth<S: TokenStore> {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    store: S,
    // Held across a refresh so one account never refreshes twice concurrently
    cache: Mutex<HashMap<String, OAuthTokens>>,
}

impl<S: TokenStore> OAuth2Auth<S> {
    pub fn new(credentials: OAuthCredentials, store: S) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exchange an authorization code for the first token pair and persist it
    pub async fn authorize(&self, account: &Account, code: &str) -> Result<OAuthTokens, AuthError> {
        log::info!("Exchanging authorization code for {}", account.full_domain());

        let tokens = self
            .request_tokens(account, "authorization_code", "code", code)
            .await?;
        self.persist(account, &tokens).await?;
        self.cache
            .lock()
            .await
            .insert(account.full_domain(), tokens.clone());
        Ok(tokens)
    }

    async fn refresh(&self, account: &Account, refresh_token: &str) -> Result<OAuthTokens, AuthError> {
        log::info!("Refreshing access token for {}", account.full_domain());

        let tokens = self
            .request_tokens(account, "refresh_token", "refresh_token", refresh_token)
            .await?;
        self.persist(account, &tokens).await?;
        Ok(tokens)
    }

    async fn request_tokens(
        &self,
        account: &Account,
        grant_type: &str,
        grant_field: &str,
        grant_value: &str,
    ) -> Result<OAuthTokens, AuthError> {
        let url = format!("{}/oauth2/access_token", account.base_url());
        let mut body = json!({
            "client_id": self.credentials.client_id,
            "client_secret": self.credentials.client_secret,
            "grant_type": grant_type,
            "redirect_uri": self.credentials.redirect_uri,
        });
        body[grant_field] = json!(grant_value);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| AuthError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        log::debug!("Token request status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let mut tokens: OAuthTokens = response
            .json()
            .await
            .map_err(|source| AuthError::Network { url, source })?;
        tokens.received_at = chrono::Utc::now().timestamp();
        Ok(tokens)
    }

    async fn persist(&self, account: &Account, tokens: &OAuthTokens) -> Result<(), AuthError> {
        let domain = account.full_domain();
        let blob = serde_json::to_value(tokens).map_err(|source| StorageError::Json {
            domain: domain.clone(),
            source,
        })?;
        self.store.save(&blob, &domain).await?;
        Ok(())
    }

    async fn load(&self, domain: &str) -> Result<OAuthTokens, AuthError> {
        if !self.store.has_tokens(domain).await? {
            return Err(AuthError::MissingTokens {
                domain: domain.to_string(),
            });
        }
        let blob = self.store.load(domain).await?;
        let tokens = serde_json::from_value(blob).map_err(|source| StorageError::Json {
            domain: domain.to_string(),
            source,
        })?;
        Ok(tokens)
    }
}

#[async_trait]
impl<S: TokenStore> AuthProvider for OAuth2Auth<S> {
    async fn access_token(&self, account: &Account) -> Result<String, AuthError> {
        let domain = account.full_domain();
        let mut cache = self.cache.lock().await;

        let tokens = match cache.get(&domain) {
            Some(tokens) => tokens.clone(),
            None => self.load(&domain).await?,
        };

        let tokens = if tokens.is_expired(chrono::Utc::now().timestamp()) {
            self.refresh(account, &tokens.refresh_token).await?
        } else {
            tokens
        };

        let access_token = tokens.access_token.clone();
        cache.insert(domain, tokens);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_includes_margin() {
        let tokens = OAuthTokens {
            token_type: "Bearer".to_string(),
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: 86400,
            received_at: 1_000,
        };

        assert!(!tokens.is_expired(1_000));
        assert!(!tokens.is_expired(1_000 + 86400 - 61));
        assert!(tokens.is_expired(1_000 + 86400 - 60));
    }
}
