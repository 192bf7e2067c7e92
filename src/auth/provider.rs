use super::AuthError;
use crate::api::transport::Account;
use async_trait::async_trait;
use std::collections::HashMap;

/// Supplies the bearer token for an account before each request
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn access_token(&self, account: &Account) -> Result<String, AuthError>;
}

/// Long-lived tokens issued in the account settings; no OAuth flow involved
#[derive(Debug, Clone, Default)]
pub struct PermanentTokenAuth {
    tokens: HashMap<String, String>,
}

impl PermanentTokenAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the token of one subdomain
    pub fn with_token(
        mut self,
        subdomain: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let subdomain = subdomain.into();
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AuthError::EmptyToken { subdomain });
        }
        self.tokens.insert(subdomain, token);
        Ok(self)
    }

    pub fn has_token(&self, subdomain: &str) -> bool {
        self.tokens.contains_key(subdomain)
    }
}

#[async_trait]
impl AuthProvider for PermanentTokenAuth {
    async fn access_token(&self, account: &Account) -> Result<String, AuthError> {
        self.tokens
            .get(&account.subdomain)
            .cloned()
            .ok_or_else(|| AuthError::MissingTokens {
                domain: account.full_domain(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_rejected() {
        let result = PermanentTokenAuth::new().with_token("acme", "  ");
        assert!(matches!(result, Err(AuthError::EmptyToken { .. })));
    }

    #[tokio::test]
    async fn test_token_is_looked_up_by_subdomain() {
        let auth = PermanentTokenAuth::new()
            .with_token("acme", "secret")
            .unwrap();

        let token = auth.access_token(&Account::new("acme")).await.unwrap();
        assert_eq!(token, "secret");

        let missing = auth.access_token(&Account::new("other")).await;
        assert!(matches!(missing, Err(AuthError::MissingTokens { domain }) if domain == "other.amocrm.ru"));
    }
}
